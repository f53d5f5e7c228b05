//! File ownership checks and repair for the target user.
//!
//! When the engine runs under `sudo`, files it writes in the target user's
//! home would otherwise end up owned by root.  Every persisted file goes
//! through [`Ownership::ensure_owner`] before and after it is written.
use std::os::unix::fs::MetadataExt as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::error::PersistenceError;
use crate::exec::Executor;

/// A resolved user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Login name.
    pub name: String,
    /// User id.
    pub uid: u32,
    /// Primary group id.
    pub gid: u32,
}

impl Identity {
    /// Resolve `name` to its uid and primary gid with `id(1)`.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` fails (unknown user) or prints a non-number.
    pub fn lookup(name: &str, executor: &dyn Executor) -> Result<Self> {
        let uid = parse_id(&executor.run("id", &["-u", name])?.stdout)
            .with_context(|| format!("resolve uid of user '{name}'"))?;
        let gid = parse_id(&executor.run("id", &["-g", name])?.stdout)
            .with_context(|| format!("resolve gid of user '{name}'"))?;
        Ok(Self {
            name: name.to_string(),
            uid,
            gid,
        })
    }
}

/// Effective uid of this process.
///
/// # Errors
///
/// Returns an error if `id -u` fails or prints a non-number.
pub fn effective_uid(executor: &dyn Executor) -> Result<u32> {
    parse_id(&executor.run("id", &["-u"])?.stdout).context("resolve effective uid")
}

/// Home directory of `name` from the passwd database (`getent passwd`).
///
/// # Errors
///
/// Returns an error if the user is unknown or the entry has no home field.
pub fn home_of(name: &str, executor: &dyn Executor) -> Result<PathBuf> {
    let entry = executor.run("getent", &["passwd", name])?.stdout;
    entry
        .trim()
        .split(':')
        .nth(5)
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .with_context(|| format!("no home directory in passwd entry for '{name}'"))
}

fn parse_id(stdout: &str) -> Result<u32> {
    stdout
        .trim()
        .parse()
        .with_context(|| format!("unexpected id output: {:?}", stdout.trim()))
}

/// Ownership policy for files written on behalf of the target user.
#[derive(Clone)]
pub struct Ownership {
    target: Identity,
    effective_uid: u32,
    executor: Arc<dyn Executor>,
}

impl std::fmt::Debug for Ownership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ownership")
            .field("target", &self.target)
            .field("effective_uid", &self.effective_uid)
            .finish_non_exhaustive()
    }
}

impl Ownership {
    /// Ownership policy for `target` when running as `effective_uid`.
    #[must_use]
    pub fn new(target: Identity, effective_uid: u32, executor: Arc<dyn Executor>) -> Self {
        Self {
            target,
            effective_uid,
            executor,
        }
    }

    /// Account files are handed to.
    #[must_use]
    pub const fn target(&self) -> &Identity {
        &self.target
    }

    /// Whether `path` is owned by someone other than the target user.
    ///
    /// A missing file is never foreign.
    #[must_use]
    pub fn is_foreign(&self, path: &Path) -> bool {
        std::fs::metadata(path).is_ok_and(|m| m.uid() != self.target.uid)
    }

    /// Hand `path` to the target user if another user owns it.
    ///
    /// Running as root this is a direct `chown(2)`; otherwise it tries a
    /// non-interactive `sudo chown`.  Returns `true` if ownership changed.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::OwnershipRepair`] carrying the exact manual
    /// repair command when the change is not possible.
    pub fn ensure_owner(&self, path: &Path) -> Result<bool, PersistenceError> {
        if !self.is_foreign(path) {
            return Ok(false);
        }
        let outcome = if self.effective_uid == 0 {
            std::os::unix::fs::chown(path, Some(self.target.uid), Some(self.target.gid))
                .map_err(|e| e.to_string())
        } else {
            let spec = format!("{}:", self.target.name);
            let path_arg = path.display().to_string();
            self.executor
                .run("sudo", &["-n", "chown", &spec, &path_arg])
                .map(|_| ())
                .map_err(|e| e.to_string())
        };
        match outcome {
            Ok(()) => {
                tracing::info!(
                    "changed owner of {} to {}",
                    path.display(),
                    self.target.name
                );
                Ok(true)
            }
            Err(reason) => Err(PersistenceError::OwnershipRepair {
                path: path.display().to_string(),
                user: self.target.name.clone(),
                reason,
                command: self.repair_command(path),
            }),
        }
    }

    /// Command a user can run to fix ownership of `path` by hand.
    #[must_use]
    pub fn repair_command(&self, path: &Path) -> String {
        format!("sudo chown {}: {}", self.target.name, path.display())
    }
}
