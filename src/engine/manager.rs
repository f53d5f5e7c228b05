//! The configuration handle passed to installers.
use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;

use super::context::Context;
use crate::error::ModuleError;
use crate::logging::TaskStatus;
use crate::modules::{ConflictKind, EnvModule, MergeConflict, ModuleRegistry, UnifiedConfig, merge, render};
use crate::resources::config_file::ConfigFileResource;
use crate::resources::shell_rc::{Shell, ShellRcResource};
use crate::resources::{Resource, ResourceChange, ResourceState};

/// Shells considered on every run, in this order.
pub const SHELLS: [Shell; 3] = [Shell::Bash, Shell::Zsh, Shell::Fish];

/// Resolved, merged, and rendered configuration, not yet persisted.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Module names in resolved order.
    pub order: Vec<String>,
    /// Merge result, conflicts included.
    pub config: UnifiedConfig,
    /// Rendered file content.
    pub content: String,
}

/// What an apply run did (or, in dry-run mode, would do).
#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    /// Where the generated file lives.
    pub config_path: PathBuf,
    /// Outcome for the generated file.  In dry-run mode a pending write is
    /// reported as `Skipped`.
    pub config_change: ResourceChange,
    /// Outcome per enabled shell.
    pub shells: Vec<(Shell, ResourceChange)>,
    /// Overrides found during the merge.
    pub conflicts: Vec<MergeConflict>,
    /// Whether writes were suppressed.
    pub dry_run: bool,
}

impl ApplyReport {
    /// Whether anything on disk changed.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.config_change == ResourceChange::Applied
            || self.shells.iter().any(|(_, c)| *c == ResourceChange::Applied)
    }
}

/// Owns the module registry for one run and drives it against the
/// filesystem.
///
/// One handle is created per run and passed to each installer, so nothing
/// is shared through process-wide state.
#[derive(Debug)]
pub struct EnvManager {
    ctx: Context,
    registry: ModuleRegistry,
}

impl EnvManager {
    /// Manager with an empty registry.
    #[must_use]
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            registry: ModuleRegistry::new(),
        }
    }

    /// Run context.
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.ctx
    }

    /// Registered modules.
    #[must_use]
    pub const fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Register one module.  Its dependencies must already be registered.
    ///
    /// # Errors
    ///
    /// Returns a [`ModuleError`] on malformed input or a missing dependency;
    /// the registry is unchanged.
    pub fn add_module(&mut self, module: EnvModule) -> Result<(), ModuleError> {
        let name = module.name.clone();
        self.registry.add(module)?;
        self.ctx.log.debug(&format!("registered module {name}"));
        Ok(())
    }

    /// Register several modules at once; they may reference each other in
    /// any order.
    ///
    /// # Errors
    ///
    /// Returns the first [`ModuleError`] found; nothing is registered.
    pub fn add_modules(&mut self, modules: Vec<EnvModule>) -> Result<(), ModuleError> {
        let count = modules.len();
        self.registry.add_all(modules)?;
        self.ctx.log.debug(&format!("registered {count} modules"));
        Ok(())
    }

    /// Remove a module nothing else depends on.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::DependentModule`] or [`ModuleError::NotFound`].
    pub fn remove_module(&mut self, name: &str) -> Result<EnvModule, ModuleError> {
        self.registry.remove(name)
    }

    /// Unregister every module.
    pub fn clear(&mut self) {
        self.registry.clear();
    }

    /// Registered modules ordered by name.
    pub fn modules(&self) -> impl Iterator<Item = &EnvModule> {
        self.registry.list()
    }

    /// Resolve, merge and render without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::CyclicDependency`] if the graph has a cycle.
    pub fn plan(&self) -> Result<Plan, ModuleError> {
        let ordered = self.registry.resolve()?;
        let order = ordered.iter().map(|m| m.name.clone()).collect();
        let config = merge(ordered);
        let content = render(&config, Utc::now());
        Ok(Plan {
            order,
            config,
            content,
        })
    }

    /// Generate the configuration file and wire it into the enabled shells.
    ///
    /// Steps run strictly in sequence and the first failure aborts the run.
    /// Each step is recorded with the logger for the summary.
    ///
    /// # Errors
    ///
    /// Returns the first failure: a [`ModuleError`] from resolution, a
    /// [`PersistenceError`](crate::error::PersistenceError) from writing, or
    /// a [`ShellIntegrationError`](crate::error::ShellIntegrationError).
    pub fn apply_configuration(&self) -> Result<ApplyReport> {
        let log = &self.ctx.log;
        let dry_run = self.ctx.dry_run;
        log.stage("Applying environment configuration");

        let ordered = match self.registry.resolve() {
            Ok(ordered) => {
                log.record_task(
                    "resolve",
                    TaskStatus::Ok,
                    Some(&format!("{} modules", ordered.len())),
                );
                ordered
            }
            Err(e) => {
                log.error(&e.to_string());
                log.record_task("resolve", TaskStatus::Failed, Some(&e.to_string()));
                return Err(e.into());
            }
        };
        let order: Vec<&str> = ordered.iter().map(|m| m.name.as_str()).collect();
        log.debug(&format!("resolved order: {}", order.join(", ")));

        let config = merge(ordered);
        self.report_conflicts(&config.conflicts);
        let conflicts = format!("{} conflicts", config.conflicts.len());
        log.record_task("merge", TaskStatus::Ok, Some(&conflicts));

        let content = render(&config, Utc::now());
        log.record_task(
            "render",
            TaskStatus::Ok,
            Some(&format!("{} bytes", content.len())),
        );

        let config_path = self.ctx.config_path();
        let file = ConfigFileResource::new(
            config_path.clone(),
            content,
            self.ctx.settings.keep_backups(),
            &self.ctx.ownership,
        );
        let config_change = self.run_step("persist", dry_run, &file)?;

        let mut shells = Vec::new();
        for shell in SHELLS {
            let name = format!("shell: {shell}");
            if !self.ctx.settings.shell_enabled(shell) {
                log.record_task(&name, TaskStatus::NotApplicable, None);
                continue;
            }
            let rc = ShellRcResource::new(shell, &self.ctx.home, config_path.clone(), &self.ctx.ownership);
            let change = self.run_step(&name, dry_run, &rc)?;
            shells.push((shell, change));
        }

        Ok(ApplyReport {
            config_path,
            config_change,
            shells,
            conflicts: config.conflicts,
            dry_run,
        })
    }

    /// Apply one resource (or preview it), recording the outcome.
    fn run_step<R: Resource>(
        &self,
        name: &str,
        dry_run: bool,
        resource: &R,
    ) -> Result<ResourceChange> {
        let log = &self.ctx.log;
        let desc = resource.description();

        let outcome = if dry_run {
            resource.current_state().map(|state| match state {
                pending if pending.is_pending() => {
                    log.dry_run(&format!("would update {desc}"));
                    ResourceChange::Skipped {
                        reason: "dry run".to_string(),
                    }
                }
                ResourceState::Invalid { reason } => ResourceChange::Skipped { reason },
                _ => ResourceChange::AlreadyCorrect,
            })
        } else {
            resource.apply()
        };

        match outcome {
            Ok(change) => {
                match &change {
                    ResourceChange::Applied => {
                        log.info(&format!("updated {desc}"));
                        log.record_task(name, TaskStatus::Ok, Some("updated"));
                    }
                    ResourceChange::AlreadyCorrect => {
                        log.debug(&format!("no change: {desc}"));
                        log.record_task(name, TaskStatus::Ok, Some("no change"));
                    }
                    ResourceChange::Skipped { reason } if dry_run && reason == "dry run" => {
                        log.record_task(name, TaskStatus::DryRun, None);
                    }
                    ResourceChange::Skipped { reason } => {
                        log.warn(&format!("skipped {desc}: {reason}"));
                        log.record_task(name, TaskStatus::Skipped, Some(reason));
                    }
                }
                Ok(change)
            }
            Err(e) => {
                log.error(&format!("{name}: {e:#}"));
                log.record_task(name, TaskStatus::Failed, Some(&format!("{e:#}")));
                Err(e)
            }
        }
    }

    /// Alias and function collisions are warnings; environment overrides
    /// are expected layering and only logged at debug level.
    fn report_conflicts(&self, conflicts: &[MergeConflict]) {
        for conflict in conflicts {
            match conflict.kind {
                ConflictKind::Alias | ConflictKind::Function => {
                    self.ctx.log.warn(&conflict.to_string());
                }
                ConflictKind::Environment => self.ctx.log.debug(&conflict.to_string()),
            }
        }
    }
}
