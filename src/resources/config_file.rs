//! Persisting the generated configuration file.
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use super::ownership::Ownership;
use super::{Applicable, Resource, ResourceChange, ResourceState, backup, fs, lock::ConfigLock};
use crate::error::PersistenceError;
use crate::modules::render::same_content;

/// The generated configuration file.
///
/// Applying it is idempotent: when the file on disk already carries the
/// desired content (ignoring the generation timestamp) nothing is touched.
#[derive(Debug)]
pub struct ConfigFileResource<'a> {
    /// Destination path.
    pub path: PathBuf,
    /// Rendered content to persist.
    pub content: String,
    /// Number of backups to keep; `None` disables backups.
    pub keep_backups: Option<usize>,
    ownership: &'a Ownership,
}

impl<'a> ConfigFileResource<'a> {
    /// Resource writing `content` to `path`.
    #[must_use]
    pub const fn new(
        path: PathBuf,
        content: String,
        keep_backups: Option<usize>,
        ownership: &'a Ownership,
    ) -> Self {
        Self {
            path,
            content,
            keep_backups,
            ownership,
        }
    }

    fn read_current(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read {}", self.path.display())),
        }
    }

    fn write(&self, path: &Path) -> Result<(), PersistenceError> {
        fs::write_atomic(path, &self.content).map_err(|source| PersistenceError::Write {
            path: path.display().to_string(),
            source,
        })
    }
}

impl Applicable for ConfigFileResource<'_> {
    fn description(&self) -> String {
        self.path.display().to_string()
    }

    fn apply(&self) -> Result<ResourceChange> {
        for dir in fs::create_parent_dirs(&self.path)? {
            self.ownership.ensure_owner(&dir)?;
        }
        let _lock = ConfigLock::acquire(&self.path)?;

        let Some(current) = self.read_current()? else {
            self.write(&self.path)?;
            self.ownership.ensure_owner(&self.path)?;
            return Ok(ResourceChange::Applied);
        };

        if same_content(&current, &self.content) {
            tracing::debug!("{} is up to date", self.path.display());
            return Ok(ResourceChange::AlreadyCorrect);
        }

        self.ownership.ensure_owner(&self.path)?;
        if let Some(keep) = self.keep_backups.filter(|&n| n > 0) {
            let saved = backup::create_backup(&self.path, keep)?;
            self.ownership.ensure_owner(&saved)?;
        }
        self.write(&self.path)?;
        self.ownership.ensure_owner(&self.path)?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for ConfigFileResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        Ok(match self.read_current()? {
            None => ResourceState::Missing,
            Some(current) if same_content(&current, &self.content) => ResourceState::Correct,
            Some(_) => ResourceState::Incorrect {
                current: "content differs".to_string(),
            },
        })
    }
}
