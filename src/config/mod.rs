//! Settings and module definitions loaded from TOML files.
pub mod modules_file;
pub mod settings;
pub mod toml_loader;
pub mod validation;

use std::path::PathBuf;

pub use settings::{BackupSettings, Settings, ShellSettings};
pub use validation::{ConfigValidator, ValidationWarning};

/// Return `$XDG_CONFIG_HOME/eee-env` (or `~/.config/eee-env`).
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
    Some(base.join("eee-env"))
}
