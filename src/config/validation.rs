//! Non-fatal checks run on settings and module files after loading.
use std::collections::BTreeMap;
use std::path::Path;

use super::Settings;
use crate::modules::EnvModule;

/// A validation warning detected during configuration loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The configuration source (e.g. "config.toml", "modules.toml").
    pub source: String,
    /// The specific item or section that triggered the warning.
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    /// Warning about `item` in `source`.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        item: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            item: item.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.source, self.item, self.message)
    }
}

/// Trait for configuration validators.
///
/// Validators never fail; they return every non-fatal issue they find.
pub trait ConfigValidator {
    /// Validate the configuration and return any warnings found.
    fn validate(&self) -> Vec<ValidationWarning>;

    /// Short name of this validator (e.g. "settings", "modules").
    fn name(&self) -> &'static str;
}

/// Validator for engine settings.
#[derive(Debug)]
pub struct SettingsValidator<'a> {
    settings: &'a Settings,
}

impl<'a> SettingsValidator<'a> {
    /// Validator over `settings`.
    #[must_use]
    pub const fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }
}

impl ConfigValidator for SettingsValidator<'_> {
    fn validate(&self) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let s = self.settings;

        if s.backup.enabled && s.backup.max_backups == 0 {
            warnings.push(ValidationWarning::new(
                "config.toml",
                "backup.max_backups",
                "backups are enabled but max_backups is 0; no backup will be kept",
            ));
        }

        if s.shells.fish {
            warnings.push(ValidationWarning::new(
                "config.toml",
                "shells.fish",
                "fish integration is not supported and will be skipped",
            ));
        }

        if s.config_file.trim().is_empty() {
            warnings.push(ValidationWarning::new(
                "config.toml",
                "config_file",
                "config_file is empty",
            ));
        } else if !s.config_file.starts_with('~') && !Path::new(&s.config_file).is_absolute() {
            warnings.push(ValidationWarning::new(
                "config.toml",
                "config_file",
                "relative config_file is resolved against the target home",
            ));
        }

        warnings
    }

    fn name(&self) -> &'static str {
        "settings"
    }
}

/// Validator for module definitions read from a file.
#[derive(Debug)]
pub struct ModulesValidator<'a> {
    modules: &'a [EnvModule],
}

impl<'a> ModulesValidator<'a> {
    /// Validator over the loaded module definitions.
    #[must_use]
    pub const fn new(modules: &'a [EnvModule]) -> Self {
        Self { modules }
    }
}

impl ConfigValidator for ModulesValidator<'_> {
    fn validate(&self) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let mut seen: BTreeMap<&str, usize> = BTreeMap::new();

        for module in self.modules {
            *seen.entry(module.name.as_str()).or_default() += 1;

            if module.condition.is_some() {
                warnings.push(ValidationWarning::new(
                    "modules.toml",
                    &module.name,
                    "condition is stored but not evaluated",
                ));
            }
            let relative = |p: &String| !p.starts_with(['/', '$', '~']);
            if module.config.paths.iter().any(relative) {
                warnings.push(ValidationWarning::new(
                    "modules.toml",
                    &module.name,
                    "relative PATH entry depends on the working directory",
                ));
            }
        }

        for (name, count) in seen {
            if count > 1 {
                warnings.push(ValidationWarning::new(
                    "modules.toml",
                    name,
                    format!("defined {count} times; the last definition wins"),
                ));
            }
        }

        warnings
    }

    fn name(&self) -> &'static str {
        "modules"
    }
}
