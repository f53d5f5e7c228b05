//! Timestamped backups of the generated configuration file.
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::PersistenceError;

/// Infix between the file name and the timestamp of a backup.
const BACKUP_INFIX: &str = ".backup.";

/// Backup path for `path` taken at `at`.
///
/// The timestamp sorts lexicographically in creation order.
#[must_use]
pub fn backup_path_for(path: &Path, at: DateTime<Utc>) -> PathBuf {
    let mut backup = path.as_os_str().to_owned();
    backup.push(BACKUP_INFIX);
    backup.push(at.format("%Y%m%dT%H%M%S%.6fZ").to_string());
    PathBuf::from(backup)
}

/// Existing backups of `path`, oldest first.
///
/// # Errors
///
/// Returns [`PersistenceError::Backup`] if the parent directory cannot be read.
pub fn list_backups(path: &Path) -> Result<Vec<PathBuf>, PersistenceError> {
    let (Some(dir), Some(name)) = (path.parent(), path.file_name()) else {
        return Ok(Vec::new());
    };
    let mut prefix = name.to_os_string();
    prefix.push(BACKUP_INFIX);
    let prefix = prefix.to_string_lossy().into_owned();

    let entries = fs::read_dir(dir).map_err(|source| PersistenceError::Backup {
        path: path.display().to_string(),
        source,
    })?;
    let mut backups: Vec<PathBuf> = entries
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().starts_with(&prefix))
        .map(|e| e.path())
        .collect();
    backups.sort();
    Ok(backups)
}

/// Copy `path` to a new timestamped backup and prune old ones so at most
/// `max_backups` remain.
///
/// Returns the new backup's path.
///
/// # Errors
///
/// Returns [`PersistenceError::Backup`] if copying or pruning fails.
pub fn create_backup(path: &Path, max_backups: usize) -> Result<PathBuf, PersistenceError> {
    let backup = backup_path_for(path, Utc::now());
    fs::copy(path, &backup).map_err(|source| PersistenceError::Backup {
        path: path.display().to_string(),
        source,
    })?;
    tracing::debug!("backed up {} to {}", path.display(), backup.display());
    prune(path, max_backups)?;
    Ok(backup)
}

/// Delete the oldest backups of `path` beyond `keep`.
fn prune(path: &Path, keep: usize) -> Result<(), PersistenceError> {
    let backups = list_backups(path)?;
    let excess = backups.len().saturating_sub(keep);
    for old in backups.iter().take(excess) {
        fs::remove_file(old).map_err(|source| PersistenceError::Backup {
            path: old.display().to_string(),
            source,
        })?;
        tracing::debug!("pruned backup {}", old.display());
    }
    Ok(())
}
