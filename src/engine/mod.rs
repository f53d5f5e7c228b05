//! Orchestration: one [`EnvManager`] per run, built from a [`Context`].
pub mod context;
pub mod manager;
pub mod validate;

pub use context::Context;
pub use manager::{ApplyReport, EnvManager, Plan};
pub use validate::{EnvironmentInfo, Issue, Severity, ValidationReport};
