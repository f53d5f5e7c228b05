//! Command: check the on-disk configuration without changing it.
use std::sync::Arc;

use anyhow::Result;

use super::CommandSetup;
use crate::cli::GlobalOpts;
use crate::engine::Severity;
use crate::logging::Logger;

/// Run the validate command.
///
/// # Errors
///
/// Returns an error if configuration loading fails or any error-level issue
/// is found.
pub fn run(global: &GlobalOpts, log: &Arc<Logger>) -> Result<()> {
    log.stage("Validating environment");
    let setup = CommandSetup::init(global, log)?;
    let report = setup.manager.validate_configuration()?;

    for issue in &report.issues {
        match issue.severity {
            Severity::Error => log.error(&issue.message),
            Severity::Warning => log.warn(&issue.message),
        }
    }

    let errors = report
        .issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .count();
    if !report.valid {
        anyhow::bail!("validation failed with {errors} error(s)");
    }
    log.info(&format!(
        "configuration is valid ({} warning(s))",
        report.issues.len()
    ));
    Ok(())
}
