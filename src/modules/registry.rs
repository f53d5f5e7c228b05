//! In-memory registry of modules for one configuration run.
use std::collections::BTreeMap;

use super::EnvModule;
use super::graph;
use crate::error::ModuleError;

/// Named modules keyed by module name.
///
/// Insertion is eager: a single [`add`](Self::add) requires every dependency
/// to be registered already.  [`add_all`](Self::add_all) registers a batch
/// whose members may reference each other in any order.
#[derive(Debug, Default, Clone)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, EnvModule>,
}

impl ModuleRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store `module`, replacing any module with the same name.
    ///
    /// # Errors
    ///
    /// - [`ModuleError::Validation`] if a name or key is malformed.
    /// - [`ModuleError::MissingDependency`] if a dependency is not registered.
    pub fn add(&mut self, module: EnvModule) -> Result<(), ModuleError> {
        module.validate()?;
        if let Some(dependency) = module
            .dependencies
            .iter()
            .find(|d| !self.modules.contains_key(d.as_str()))
        {
            return Err(ModuleError::MissingDependency {
                module: module.name.clone(),
                dependency: dependency.clone(),
            });
        }
        self.modules.insert(module.name.clone(), module);
        Ok(())
    }

    /// Register a batch of modules as one unit.
    ///
    /// Each dependency must resolve to a module already registered or present
    /// in the batch, and the combined graph must be acyclic.  Later entries
    /// with a duplicate name win.  On error nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns the first validation, missing-dependency, or cycle error found.
    pub fn add_all(&mut self, modules: impl IntoIterator<Item = EnvModule>) -> Result<(), ModuleError> {
        let mut staged = self.modules.clone();
        let mut batch = Vec::new();
        for module in modules {
            module.validate()?;
            batch.push(module.name.clone());
            staged.insert(module.name.clone(), module);
        }

        for name in &batch {
            let Some(module) = staged.get(name) else {
                continue;
            };
            if let Some(dependency) = module
                .dependencies
                .iter()
                .find(|d| !staged.contains_key(d.as_str()))
            {
                return Err(ModuleError::MissingDependency {
                    module: name.clone(),
                    dependency: dependency.clone(),
                });
            }
        }

        graph::resolve_order(&staged)?;
        self.modules = staged;
        Ok(())
    }

    /// Remove and return the module called `name`.
    ///
    /// # Errors
    ///
    /// - [`ModuleError::DependentModule`] if another module depends on it.
    /// - [`ModuleError::NotFound`] if it is not registered.
    pub fn remove(&mut self, name: &str) -> Result<EnvModule, ModuleError> {
        let dependents: Vec<String> = self
            .modules
            .values()
            .filter(|m| m.name != name && m.dependencies.contains(name))
            .map(|m| m.name.clone())
            .collect();
        if !dependents.is_empty() {
            return Err(ModuleError::DependentModule {
                module: name.to_string(),
                dependents,
            });
        }
        self.modules
            .remove(name)
            .ok_or_else(|| ModuleError::NotFound(name.to_string()))
    }

    /// Remove every module.
    pub fn clear(&mut self) {
        self.modules.clear();
    }

    /// All registered modules, ordered by name.
    pub fn list(&self) -> impl Iterator<Item = &EnvModule> {
        self.modules.values()
    }

    /// Number of registered modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// True when no module is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Modules in dependency-then-priority order.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::CyclicDependency`] if the graph contains a cycle.
    pub fn resolve(&self) -> Result<Vec<&EnvModule>, ModuleError> {
        graph::resolve_order(&self.modules)
    }
}
