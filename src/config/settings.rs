//! Engine settings (`config.toml`).
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::toml_loader;
use crate::resources::fs::expand_home;
use crate::resources::shell_rc::Shell;

/// Default location of the generated file, relative to the target home.
pub const DEFAULT_CONFIG_FILE: &str = "~/.eee-env";

/// Backup rotation for the generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackupSettings {
    /// Copy the previous file aside before overwriting it.
    pub enabled: bool,
    /// Newest backups kept; older ones are deleted.
    pub max_backups: usize,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_backups: 5,
        }
    }
}

/// Which shells get a startup-file block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellSettings {
    /// Integrate `~/.bashrc`.
    pub bash: bool,
    /// Integrate `~/.zshrc`.
    pub zsh: bool,
    /// Reported as skipped; fish cannot source POSIX shell.
    pub fish: bool,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            bash: true,
            zsh: true,
            fish: false,
        }
    }
}

/// Top-level settings.  Every field has a default, so a missing file is fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Generated file location; `~/` expands to the target home.
    pub config_file: String,
    /// Account that must own every written file.
    pub target_user: Option<String>,
    /// Backup rotation.
    pub backup: BackupSettings,
    /// Shell integration switches.
    pub shells: ShellSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_file: DEFAULT_CONFIG_FILE.to_string(),
            target_user: None,
            backup: BackupSettings::default(),
            shells: ShellSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from `path`; a missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is not valid settings TOML.
    pub fn load(path: &Path) -> Result<Self> {
        toml_loader::load_config(path)
    }

    /// Absolute path of the generated file for `home`.
    #[must_use]
    pub fn config_path(&self, home: &Path) -> PathBuf {
        let path = expand_home(&self.config_file, home);
        if path.is_absolute() {
            path
        } else {
            home.join(path)
        }
    }

    /// Number of backups to keep, or `None` when backups are off.
    #[must_use]
    pub const fn keep_backups(&self) -> Option<usize> {
        if self.backup.enabled {
            Some(self.backup.max_backups)
        } else {
            None
        }
    }

    /// Whether `shell` is switched on.
    #[must_use]
    pub const fn shell_enabled(&self, shell: Shell) -> bool {
        match shell {
            Shell::Bash => self.shells.bash,
            Shell::Zsh => self.shells.zsh,
            Shell::Fish => self.shells.fish,
        }
    }

    /// Target user: the configured one, else `SUDO_USER`, else `USER`.
    #[must_use]
    pub fn target_user_name(&self) -> Option<String> {
        self.target_user
            .clone()
            .or_else(|| non_empty_var("SUDO_USER"))
            .or_else(|| non_empty_var("USER"))
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
