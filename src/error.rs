//! Domain-specific error types for the environment engine.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Registry operations return [`ModuleError`] directly so callers can match
//! on the variant.  Resource and engine operations return [`anyhow::Error`]
//! whose root cause is one of the typed errors below; callers that care use
//! [`anyhow::Error::downcast_ref`].
//!
//! - [`ModuleError`]: registration, removal, resolution
//! - [`PersistenceError`]: ownership, backups, writes, locking
//! - [`ShellIntegrationError`]: startup file create/append

use thiserror::Error;

/// Errors raised by the module registry and the dependency resolver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModuleError {
    /// A module name, key, or value is malformed.
    #[error("invalid module '{module}': {message}")]
    Validation {
        /// Name of the offending module (as given).
        module: String,
        /// What is wrong with it.
        message: String,
    },

    /// A declared dependency is not registered.
    #[error("module '{module}' depends on '{dependency}', which is not registered")]
    MissingDependency {
        /// Module declaring the dependency.
        module: String,
        /// The unregistered dependency.
        dependency: String,
    },

    /// The module is still required by other registered modules.
    #[error("cannot remove module '{module}': required by {}", .dependents.join(", "))]
    DependentModule {
        /// Module whose removal was requested.
        module: String,
        /// Registered modules that depend on it.
        dependents: Vec<String>,
    },

    /// The dependency graph contains a cycle passing through this module.
    #[error("dependency cycle detected at module '{0}'")]
    CyclicDependency(String),

    /// No module with this name is registered.
    #[error("module '{0}' is not registered")]
    NotFound(String),
}

/// Errors raised while persisting the generated configuration file.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// The file is owned by another user and could not be handed back.
    #[error("cannot change owner of {path} to {user} ({reason}); fix it manually with: {command}")]
    OwnershipRepair {
        /// File whose ownership could not be changed.
        path: String,
        /// Target user name.
        user: String,
        /// Why the change failed.
        reason: String,
        /// Command that repairs ownership by hand.
        command: String,
    },

    /// Writing the new content failed.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Destination file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Creating or pruning a backup failed.
    #[error("failed to back up {path}: {source}")]
    Backup {
        /// File being backed up.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Another process holds the configuration lock.
    #[error(
        "{path} is being updated by {}; if that process is gone run: rm {lock}",
        .pid.map_or_else(|| "another process".to_string(), |p| format!("process {p}"))
    )]
    Locked {
        /// Configuration file being protected.
        path: String,
        /// PID recorded in the lock file; `None` while the holder is still
        /// writing it.
        pid: Option<u32>,
        /// Lock file path.
        lock: String,
    },
}

/// Errors raised while wiring the generated file into shell startup files.
#[derive(Error, Debug)]
pub enum ShellIntegrationError {
    /// The startup file did not exist and could not be created.
    #[error("cannot create {path}: {source}")]
    Create {
        /// Startup file path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The source block could not be appended.
    #[error("cannot append to {path}: {source}")]
    Append {
        /// Startup file path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
