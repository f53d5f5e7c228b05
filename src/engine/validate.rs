//! Read-only checks and introspection over an [`EnvManager`].
use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;
use sha2::{Digest as _, Sha256};

use super::manager::{EnvManager, SHELLS};
use crate::modules::MergeConflict;
use crate::modules::render::significant_lines;
use crate::resources::config_file::ConfigFileResource;
use crate::resources::shell_rc::{Shell, ShellRcResource};
use crate::resources::{Applicable as _, Resource, ResourceState};

/// How serious a validation issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Makes the report invalid.
    Error,
    /// Reported but harmless.
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warning => "warning",
        })
    }
}

/// One finding of [`EnvManager::validate_configuration`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// How serious it is.
    pub severity: Severity,
    /// What is wrong.
    pub message: String,
}

impl Issue {
    fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// Outcome of a validation run.  `valid` is false when any issue is an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// No issue is an error.
    pub valid: bool,
    /// Errors first, then warnings.
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    fn from_issues(issues: Vec<Issue>) -> Self {
        Self {
            valid: !issues.iter().any(|i| i.severity == Severity::Error),
            issues,
        }
    }
}

/// A registered module as shown by `inspect`.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleSummary {
    /// Module name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Ordering priority.
    pub priority: i32,
    /// Direct dependencies, sorted.
    pub dependencies: Vec<String>,
}

/// Integration status of one shell.
#[derive(Debug, Clone, Serialize)]
pub struct ShellStatus {
    /// Which shell.
    pub shell: Shell,
    /// Switched on in settings.
    pub enabled: bool,
    /// Startup file, if the shell has one we manage.
    pub rc_file: Option<PathBuf>,
    /// Whether the startup file sources the generated file.
    #[serde(flatten)]
    pub state: ResourceState,
}

/// Snapshot of the engine and on-disk state.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentInfo {
    /// Account that owns the written files.
    pub target_user: String,
    /// Its home directory.
    pub home: PathBuf,
    /// Generated file location.
    pub config_path: PathBuf,
    /// Whether that file exists.
    pub config_exists: bool,
    /// Whether the file on disk matches what `apply` would write.
    pub up_to_date: bool,
    /// SHA-256 of the rendered content without its timestamp line.
    pub digest: String,
    /// Registered modules by name.
    pub modules: Vec<ModuleSummary>,
    /// Order the modules are merged in.
    pub resolved_order: Vec<String>,
    /// One entry per known shell.
    pub shells: Vec<ShellStatus>,
    /// Overrides found during the merge.
    pub conflicts: Vec<MergeConflict>,
}

impl EnvManager {
    /// Check the on-disk state against the registered modules.
    ///
    /// Nothing is written.  Errors: unresolvable modules, a missing
    /// configuration file, an enabled shell that does not source it.
    /// Warnings: a stale file, a file owned by another user, an enabled
    /// unsupported shell, merge conflicts.
    ///
    /// # Errors
    ///
    /// Returns an error only when a file exists but cannot be read.
    pub fn validate_configuration(&self) -> Result<ValidationReport> {
        let ctx = self.context();
        let config_path = ctx.config_path();
        let mut issues = Vec::new();

        match self.plan() {
            Ok(plan) => {
                let file = ConfigFileResource::new(
                    config_path.clone(),
                    plan.content,
                    None,
                    &ctx.ownership,
                );
                match file.current_state()? {
                    ResourceState::Missing => issues.push(Issue::error(format!(
                        "configuration file {} does not exist",
                        config_path.display()
                    ))),
                    ResourceState::Incorrect { .. } => issues.push(Issue::warning(format!(
                        "configuration file {} is out of date; run apply",
                        config_path.display()
                    ))),
                    ResourceState::Correct | ResourceState::Invalid { .. } => {}
                }
                issues.extend(
                    plan.config
                        .conflicts
                        .iter()
                        .map(|c| Issue::warning(c.to_string())),
                );
            }
            Err(e) => {
                issues.push(Issue::error(e.to_string()));
                if !config_path.exists() {
                    issues.push(Issue::error(format!(
                        "configuration file {} does not exist",
                        config_path.display()
                    )));
                }
            }
        }

        if ctx.ownership.is_foreign(&config_path) {
            issues.push(Issue::warning(format!(
                "{} is not owned by {}; fix with: {}",
                config_path.display(),
                ctx.ownership.target().name,
                ctx.ownership.repair_command(&config_path)
            )));
        }

        for shell in SHELLS {
            if !ctx.settings.shell_enabled(shell) {
                continue;
            }
            let rc = ShellRcResource::new(shell, &ctx.home, config_path.clone(), &ctx.ownership);
            match rc.current_state()? {
                ResourceState::Correct => {}
                ResourceState::Invalid { reason } => issues.push(Issue::warning(reason)),
                ResourceState::Missing | ResourceState::Incorrect { .. } => {
                    issues.push(Issue::error(format!(
                        "{shell} does not source {} ({})",
                        config_path.display(),
                        rc.description()
                    )));
                }
            }
        }

        let report = ValidationReport::from_issues(issues);
        ctx.log.debug(&format!(
            "validation finished: {} issue(s), valid={}",
            report.issues.len(),
            report.valid
        ));
        Ok(report)
    }

    /// Describe the registered modules, their resolution, and the on-disk
    /// state.  Read-only.
    ///
    /// # Errors
    ///
    /// Returns a [`ModuleError`](crate::error::ModuleError) if the modules
    /// cannot be resolved, or an I/O error if a file cannot be read.
    pub fn environment_info(&self) -> Result<EnvironmentInfo> {
        let ctx = self.context();
        let plan = self.plan()?;
        let config_path = ctx.config_path();

        let digest = content_digest(&plan.content);
        let file = ConfigFileResource::new(config_path.clone(), plan.content, None, &ctx.ownership);
        let state = file.current_state()?;

        let mut shells = Vec::new();
        for shell in SHELLS {
            let rc = ShellRcResource::new(shell, &ctx.home, config_path.clone(), &ctx.ownership);
            shells.push(ShellStatus {
                shell,
                enabled: ctx.settings.shell_enabled(shell),
                state: rc.current_state()?,
                rc_file: rc.rc_path,
            });
        }

        Ok(EnvironmentInfo {
            target_user: ctx.ownership.target().name.clone(),
            home: ctx.home.clone(),
            config_exists: state != ResourceState::Missing,
            up_to_date: state == ResourceState::Correct,
            config_path,
            digest,
            modules: self
                .modules()
                .map(|m| ModuleSummary {
                    name: m.name.clone(),
                    description: m.description.clone(),
                    priority: m.config.priority,
                    dependencies: m.dependencies.iter().cloned().collect(),
                })
                .collect(),
            resolved_order: plan.order,
            shells,
            conflicts: plan.config.conflicts,
        })
    }
}

/// Lowercase hex SHA-256 of `content` with the timestamp line removed, so
/// the digest only changes when the configuration does.
#[must_use]
pub fn content_digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    for line in significant_lines(content) {
        hasher.update(line.as_bytes());
        hasher.update(b"\n");
    }
    let result = hasher.finalize();
    let mut hex = String::with_capacity(64);
    for b in &result {
        write!(hex, "{b:02x}").unwrap_or(());
    }
    hex
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::engine::test_helpers::{TestEnv, manager};
    use crate::modules::EnvModule;

    #[test]
    fn fresh_home_is_invalid() {
        let env = TestEnv::new();
        let mut mgr = manager(&env, false);
        mgr.add_module(EnvModule::new("base").env("A", "1")).unwrap();

        let report = mgr.validate_configuration().unwrap();
        assert!(!report.valid);
        let errors: Vec<&str> = report
            .issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .map(|i| i.message.as_str())
            .collect();
        assert_eq!(errors.len(), 3, "{errors:?}");
        assert!(errors[0].contains("does not exist"));
        assert!(errors[1].starts_with("bash does not source"));
        assert!(errors[2].starts_with("zsh does not source"));
        assert_eq!(std::fs::read_dir(env.home()).unwrap().count(), 0);
    }

    #[test]
    fn valid_after_apply() {
        let env = TestEnv::new();
        let mut mgr = manager(&env, false);
        mgr.add_module(EnvModule::new("base").env("A", "1")).unwrap();
        mgr.apply_configuration().unwrap();

        let report = mgr.validate_configuration().unwrap();
        assert!(report.valid, "{:?}", report.issues);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn stale_file_and_conflicts_are_warnings() {
        let env = TestEnv::new();
        let mut mgr = manager(&env, false);
        mgr.add_module(EnvModule::new("a").priority(10).alias("ll", "ls -l"))
            .unwrap();
        mgr.apply_configuration().unwrap();
        mgr.add_module(EnvModule::new("b").priority(50).alias("ll", "ls -la"))
            .unwrap();

        let report = mgr.validate_configuration().unwrap();
        assert!(report.valid);
        assert_eq!(report.issues.len(), 2);
        assert!(report.issues.iter().all(|i| i.severity == Severity::Warning));
        assert!(report.issues[0].message.contains("out of date"));
        assert!(report.issues[1].message.contains("alias 'll'"));
    }

    #[test]
    fn fish_enabled_warns() {
        let env = TestEnv::new();
        let mut settings = env.settings.clone();
        settings.shells.bash = false;
        settings.shells.zsh = false;
        settings.shells.fish = true;
        let mgr = EnvManager::new(env.context_with(settings, false));
        mgr.apply_configuration().unwrap();

        let report = mgr.validate_configuration().unwrap();
        assert!(report.valid);
        assert_eq!(
            report.issues,
            vec![Issue::warning("fish integration is not supported")]
        );
    }

    #[test]
    fn cycle_is_reported_as_error() {
        let env = TestEnv::new();
        let mut mgr = manager(&env, false);
        mgr.add_module(EnvModule::new("a")).unwrap();
        mgr.add_module(EnvModule::new("b").depends_on("a")).unwrap();
        mgr.add_module(EnvModule::new("a").depends_on("b")).unwrap();

        let report = mgr.validate_configuration().unwrap();
        assert!(!report.valid);
        assert!(report.issues[0].message.contains("dependency cycle"));
        assert!(mgr.environment_info().is_err());
    }

    #[test]
    fn info_reflects_disk_state() {
        let env = TestEnv::new();
        let mut mgr = manager(&env, false);
        mgr.add_modules(vec![
            EnvModule::new("tool").depends_on("base").path("/opt/tool/bin"),
            EnvModule::new("base").priority(10).env("A", "1"),
        ])
        .unwrap();

        let before = mgr.environment_info().unwrap();
        assert!(!before.config_exists);
        assert!(!before.up_to_date);
        assert_eq!(before.resolved_order, ["base", "tool"]);
        assert_eq!(before.modules[1].dependencies, ["base"]);
        assert_eq!(before.shells.len(), 3);
        assert_eq!(before.shells[0].state, ResourceState::Missing);
        assert!(!before.shells[2].enabled);

        mgr.apply_configuration().unwrap();
        let after = mgr.environment_info().unwrap();
        assert!(after.config_exists);
        assert!(after.up_to_date);
        assert_eq!(after.shells[0].state, ResourceState::Correct);
        assert_eq!(after.digest, before.digest);
        assert_eq!(after.digest.len(), 64);
    }

    #[test]
    fn info_serializes_to_json() {
        let env = TestEnv::new();
        let mut mgr = manager(&env, false);
        mgr.add_module(EnvModule::new("base")).unwrap();
        let json = serde_json::to_value(mgr.environment_info().unwrap()).unwrap();
        assert_eq!(json["shells"][0]["shell"], "bash");
        assert_eq!(json["shells"][0]["state"], "missing");
        assert_eq!(json["shells"][2]["state"], "invalid");
        assert_eq!(json["modules"][0]["name"], "base");
    }

    #[test]
    fn digest_ignores_timestamp() {
        let a = "#!/bin/bash\n# EEE\n# Generated at: 2024-01-01T00:00:00Z\nexport A=\"1\"\n";
        let b = "#!/bin/bash\n# EEE\n# Generated at: 2026-03-03T12:00:00Z\nexport A=\"1\"\n";
        let c = "#!/bin/bash\n# EEE\n# Generated at: 2026-03-03T12:00:00Z\nexport A=\"2\"\n";
        assert_eq!(content_digest(a), content_digest(b));
        assert_ne!(content_digest(a), content_digest(c));
    }
}
