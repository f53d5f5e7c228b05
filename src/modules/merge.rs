//! Fold resolved modules into one unified configuration.
use serde::Serialize;

use super::{Alias, EnvModule, EnvVar, ShellFunction};

/// Which kind of definition collided during a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    /// An exported environment variable.
    Environment,
    /// A shell alias.
    Alias,
    /// A shell function.
    Function,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Environment => "environment variable",
            Self::Alias => "alias",
            Self::Function => "function",
        })
    }
}

/// A key defined with different values by two modules.  The later module wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeConflict {
    /// What collided.
    pub kind: ConflictKind,
    /// Variable, alias, or function name.
    pub key: String,
    /// Module whose value was replaced.
    pub previous_module: String,
    /// Module whose value was kept.
    pub module: String,
}

impl std::fmt::Display for MergeConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} '{}' from module '{}' overridden by module '{}'",
            self.kind, self.key, self.previous_module, self.module
        )
    }
}

/// The merged configuration of every registered module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnifiedConfig {
    /// Exports, first definition order, last value wins.
    pub environment: Vec<EnvVar>,
    /// PATH entries, deduplicated, in module order.
    pub paths: Vec<String>,
    /// Aliases, last definition wins.
    pub aliases: Vec<Alias>,
    /// Functions, last definition wins.
    pub functions: Vec<ShellFunction>,
    /// Raw shell lines, concatenated in module order.
    pub custom_code: Vec<String>,
    /// Every override that happened during the merge.
    pub conflicts: Vec<MergeConflict>,
}

impl UnifiedConfig {
    /// True when there is nothing to render.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.environment.is_empty()
            && self.paths.is_empty()
            && self.aliases.is_empty()
            && self.functions.is_empty()
            && self.custom_code.is_empty()
    }
}

/// A keyed entry that remembers which module last set it.
struct Slot<T> {
    owner: String,
    value: T,
}

/// Insert `value` under `key`, keeping the first-seen position.
///
/// Returns the module that previously owned `key` when the value changed.
fn upsert<T: PartialEq>(
    slots: &mut Vec<(String, Slot<T>)>,
    key: &str,
    owner: &str,
    value: T,
) -> Option<String> {
    if let Some((_, slot)) = slots.iter_mut().find(|(k, _)| k == key) {
        let replaced = (slot.value != value).then(|| slot.owner.clone());
        slot.owner = owner.to_string();
        slot.value = value;
        return replaced;
    }
    slots.push((
        key.to_string(),
        Slot {
            owner: owner.to_string(),
            value,
        },
    ));
    None
}

/// Merge modules in the given order.
///
/// - environment: later modules overwrite earlier values
/// - paths: appended if not already present (exact match)
/// - aliases, functions: later value wins; differing values are recorded as conflicts
/// - custom code: concatenated
///
/// Environment overwrites are recorded as conflicts too; callers decide how
/// loudly to report each kind.
#[must_use]
pub fn merge<'a>(modules: impl IntoIterator<Item = &'a EnvModule>) -> UnifiedConfig {
    let mut environment: Vec<(String, Slot<String>)> = Vec::new();
    let mut aliases: Vec<(String, Slot<String>)> = Vec::new();
    let mut functions: Vec<(String, Slot<String>)> = Vec::new();
    let mut unified = UnifiedConfig::default();

    for module in modules {
        let cfg = &module.config;

        for var in &cfg.environment {
            if let Some(previous) = upsert(&mut environment, &var.name, &module.name, var.value.clone()) {
                unified.conflicts.push(MergeConflict {
                    kind: ConflictKind::Environment,
                    key: var.name.clone(),
                    previous_module: previous,
                    module: module.name.clone(),
                });
            }
        }

        for dir in &cfg.paths {
            if !unified.paths.contains(dir) {
                unified.paths.push(dir.clone());
            }
        }

        for alias in &cfg.aliases {
            if let Some(previous) = upsert(&mut aliases, &alias.name, &module.name, alias.command.clone()) {
                unified.conflicts.push(MergeConflict {
                    kind: ConflictKind::Alias,
                    key: alias.name.clone(),
                    previous_module: previous,
                    module: module.name.clone(),
                });
            }
        }

        for function in &cfg.functions {
            if let Some(previous) = upsert(&mut functions, &function.name, &module.name, function.body.clone()) {
                unified.conflicts.push(MergeConflict {
                    kind: ConflictKind::Function,
                    key: function.name.clone(),
                    previous_module: previous,
                    module: module.name.clone(),
                });
            }
        }

        unified.custom_code.extend(cfg.custom_code.iter().cloned());
    }

    unified.environment = environment
        .into_iter()
        .map(|(name, slot)| EnvVar {
            name,
            value: slot.value,
        })
        .collect();
    unified.aliases = aliases
        .into_iter()
        .map(|(name, slot)| Alias {
            name,
            command: slot.value,
        })
        .collect();
    unified.functions = functions
        .into_iter()
        .map(|(name, slot)| ShellFunction {
            name,
            body: slot.value,
        })
        .collect();
    unified
}
