//! Environment modules: declaration, registration, ordering, merging, rendering.
//!
//! Everything here is pure and in-memory.  Filesystem effects live in
//! [`crate::resources`].
pub mod graph;
pub mod merge;
mod module;
pub mod registry;
pub mod render;

pub use merge::{ConflictKind, MergeConflict, UnifiedConfig, merge};
pub use module::{Alias, DEFAULT_PRIORITY, EnvModule, EnvVar, ModuleConfig, ShellFunction};
pub use registry::ModuleRegistry;
pub use render::render;
