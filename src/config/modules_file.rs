//! Module definitions (`modules.toml`).
use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

use super::toml_loader;
use crate::modules::EnvModule;

/// Root of the modules file: an array of `[[modules]]` tables.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModulesFile {
    #[serde(default)]
    modules: Vec<EnvModule>,
}

/// Load every module declared in `path`, in file order.
///
/// A missing file yields no modules.  Nothing is validated here; the
/// registry does that on insertion.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load(path: &Path) -> Result<Vec<EnvModule>> {
    let file: ModulesFile = toml_loader::load_config(path)?;
    Ok(file.modules)
}
