//! Module dependency graph utilities.

use std::collections::{BTreeMap, HashMap};

use super::EnvModule;
use crate::error::ModuleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Visited,
}

/// Produce a total order over `modules` in which every module follows its
/// dependencies.
///
/// Names are first sorted by ascending priority, then name; a depth-first
/// visit in that order emits dependencies before dependents.  Dependencies
/// that are not present in `modules` are ignored here; the registry rejects
/// them on insertion.
///
/// # Errors
///
/// Returns [`ModuleError::CyclicDependency`] naming the module that closes
/// the cycle.
pub fn resolve_order<'a>(
    modules: &'a BTreeMap<String, EnvModule>,
) -> Result<Vec<&'a EnvModule>, ModuleError> {
    let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(modules.len());
    let mut order = Vec::with_capacity(modules.len());

    for module in by_priority(modules.values()) {
        visit(module, modules, &mut marks, &mut order)?;
    }

    Ok(order)
}

fn by_priority<'a>(modules: impl Iterator<Item = &'a EnvModule>) -> Vec<&'a EnvModule> {
    let mut sorted: Vec<&EnvModule> = modules.collect();
    sorted.sort_by(|a, b| {
        a.config
            .priority
            .cmp(&b.config.priority)
            .then_with(|| a.name.cmp(&b.name))
    });
    sorted
}

fn visit<'a>(
    module: &'a EnvModule,
    modules: &'a BTreeMap<String, EnvModule>,
    marks: &mut HashMap<&'a str, Mark>,
    order: &mut Vec<&'a EnvModule>,
) -> Result<(), ModuleError> {
    match marks.get(module.name.as_str()) {
        Some(Mark::Visited) => return Ok(()),
        Some(Mark::Visiting) => return Err(ModuleError::CyclicDependency(module.name.clone())),
        None => {}
    }

    marks.insert(module.name.as_str(), Mark::Visiting);
    let deps = by_priority(
        module
            .dependencies
            .iter()
            .filter_map(|name| modules.get(name)),
    );
    for dep in deps {
        visit(dep, modules, marks, order)?;
    }
    marks.insert(module.name.as_str(), Mark::Visited);
    order.push(module);
    Ok(())
}
