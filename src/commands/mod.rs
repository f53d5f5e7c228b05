//! Subcommand orchestration.
pub mod apply;
pub mod inspect;
pub mod validate;
pub mod version;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::validation::{ModulesValidator, SettingsValidator};
use crate::config::{ConfigValidator, Settings, default_config_dir, modules_file};
use crate::engine::{Context, EnvManager};
use crate::exec::SystemExecutor;
use crate::installer::{StaticModules, run_installers};
use crate::logging::{Log, Logger};

/// Shared state produced by the common command setup sequence.
///
/// Loads settings and module definitions, reports validation warnings, and
/// registers the modules with a fresh [`EnvManager`].
#[derive(Debug)]
pub struct CommandSetup {
    /// Manager with every module registered.
    pub manager: EnvManager,
}

impl CommandSetup {
    /// Load configuration and build the manager for this run.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file fails to parse, the target
    /// user cannot be resolved, or the modules cannot be registered.
    pub fn init(global: &GlobalOpts, log: &Arc<Logger>) -> Result<Self> {
        let config_path = resolve_path(global.config.as_deref(), "config.toml")?;
        let modules_path = resolve_path(global.modules.as_deref(), "modules.toml")?;

        log.debug(&format!("settings: {}", config_path.display()));
        let settings = Settings::load(&config_path)?;
        log.debug(&format!("modules: {}", modules_path.display()));
        let modules = modules_file::load(&modules_path)?;
        log.debug(&format!("{} module definitions", modules.len()));

        // Validate configuration and display warnings
        let warnings: Vec<_> = {
            let validators: [&dyn ConfigValidator; 2] = [
                &SettingsValidator::new(&settings),
                &ModulesValidator::new(&modules),
            ];
            validators.iter().flat_map(|v| v.validate()).collect()
        };
        if !warnings.is_empty() {
            log.warn(&format!(
                "found {} configuration warning(s):",
                warnings.len()
            ));
            for warning in &warnings {
                log.warn(&format!(
                    "  {} [{}]: {}",
                    warning.source, warning.item, warning.message
                ));
            }
        }

        let sink: Arc<dyn Log> = log.clone();
        let ctx = Context::new(
            settings,
            global.home.clone(),
            sink,
            Arc::new(SystemExecutor),
            global.dry_run,
        )?;
        let mut manager = EnvManager::new(ctx);

        let package = StaticModules::new(modules_path.display().to_string(), modules);
        run_installers(&[&package], &mut manager)?;

        Ok(Self { manager })
    }
}

/// `explicit`, or `file` inside the default configuration directory.
fn resolve_path(explicit: Option<&Path>, file: &str) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => default_config_dir()
            .map(|dir| dir.join(file))
            .with_context(|| format!("cannot locate {file}: neither XDG_CONFIG_HOME nor HOME is set")),
    }
}
