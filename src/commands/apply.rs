//! Command: generate the configuration file and integrate shells.
use std::sync::Arc;

use anyhow::Result;

use super::CommandSetup;
use crate::cli::GlobalOpts;
use crate::logging::Logger;

/// Run the apply command.
///
/// # Errors
///
/// Returns an error if configuration loading fails or any apply step fails.
pub fn run(global: &GlobalOpts, log: &Arc<Logger>) -> Result<()> {
    log.info(&format!("eee-env {}", super::version::current()));

    log.stage("Loading configuration");
    let setup = CommandSetup::init(global, log)?;
    log.info(&format!(
        "{} modules registered",
        setup.manager.registry().len()
    ));

    let result = setup.manager.apply_configuration();
    log.print_summary();
    let report = result?;

    if report.dry_run {
        log.info("dry run: no files were changed");
    } else if report.changed() {
        log.info(&format!("environment updated: {}", report.config_path.display()));
    } else {
        log.info("environment already up to date");
    }
    if !report.conflicts.is_empty() {
        log.info(&format!(
            "{} merge conflict(s); later modules won",
            report.conflicts.len()
        ));
    }

    if log.failure_count() > 0 {
        anyhow::bail!("one or more steps failed");
    }
    Ok(())
}
