//! Installer packages contributing to the shell environment.
//!
//! Each package implements [`Installer`] and receives the run's
//! [`EnvManager`] in its hooks.  Packages run one after another; the first
//! failing hook aborts the whole sequence.
use anyhow::{Context as _, Result};

use crate::engine::EnvManager;
use crate::modules::EnvModule;

/// A package that contributes modules (and possibly applies them).
///
/// All hooks default to doing nothing.
pub trait Installer {
    /// Package name used in logs and error context.
    fn name(&self) -> &str;

    /// Runs before any package's `install`.
    ///
    /// # Errors
    ///
    /// Returns an error to abort the install sequence.
    fn pre_install(&self, _env: &mut EnvManager) -> Result<()> {
        Ok(())
    }

    /// Register modules with the manager.
    ///
    /// # Errors
    ///
    /// Returns an error to abort the install sequence.
    fn install(&self, _env: &mut EnvManager) -> Result<()> {
        Ok(())
    }

    /// Runs after every package's `install`.
    ///
    /// # Errors
    ///
    /// Returns an error to abort the install sequence.
    fn post_install(&self, _env: &mut EnvManager) -> Result<()> {
        Ok(())
    }
}

/// Run every installer's hooks in phase order: all `pre_install`, then all
/// `install`, then all `post_install`.
///
/// # Errors
///
/// Returns the first hook failure, annotated with package and phase.
pub fn run_installers(installers: &[&dyn Installer], env: &mut EnvManager) -> Result<()> {
    type Hook = fn(&dyn Installer, &mut EnvManager) -> Result<()>;
    let phases: [(&str, Hook); 3] = [
        ("pre_install", |i, e| i.pre_install(e)),
        ("install", |i, e| i.install(e)),
        ("post_install", |i, e| i.post_install(e)),
    ];

    for (phase, hook) in phases {
        for installer in installers {
            env.context()
                .log
                .debug(&format!("{phase}: {}", installer.name()));
            hook(*installer, env)
                .with_context(|| format!("{phase} failed for package '{}'", installer.name()))?;
        }
    }
    Ok(())
}

/// A package whose modules are known up front, such as the modules file.
///
/// The modules are registered as one batch, so they may reference each
/// other in any order.
#[derive(Debug, Clone)]
pub struct StaticModules {
    name: String,
    modules: Vec<EnvModule>,
}

impl StaticModules {
    /// Installer `name` contributing `modules`.
    #[must_use]
    pub fn new(name: impl Into<String>, modules: Vec<EnvModule>) -> Self {
        Self {
            name: name.into(),
            modules,
        }
    }
}

impl Installer for StaticModules {
    fn name(&self) -> &str {
        &self.name
    }

    fn install(&self, env: &mut EnvManager) -> Result<()> {
        env.add_modules(self.modules.clone())?;
        Ok(())
    }
}
