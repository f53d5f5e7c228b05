//! Shared TOML reader for `settings.toml` and `modules.toml`.
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Read `path` as TOML into `T`.
///
/// An absent file reads as an empty table, leaving every field at its serde
/// default.
///
/// # Errors
///
/// Returns an error if the file exists but is unreadable or not valid TOML
/// for `T`.
pub fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e).with_context(|| format!("cannot read {}", path.display())),
    };
    toml::from_str(&text).with_context(|| format!("invalid TOML in {}", path.display()))
}
