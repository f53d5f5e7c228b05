//! File-system resource helpers.
use anyhow::{Context as _, Result};
use std::io::Write as _;
use std::os::unix::fs::{OpenOptionsExt as _, PermissionsExt as _};
use std::path::{Path, PathBuf};

/// Mode given to every file this crate writes.
pub const FILE_MODE: u32 = 0o644;

/// Create whatever is missing of `path`'s parent directory chain,
/// outermost first.
///
/// Returns the directories this call created, outermost first, so the
/// caller can hand them to the target user.
///
/// # Errors
///
/// Returns an error if a directory cannot be created.
pub fn create_parent_dirs(path: &Path) -> Result<Vec<PathBuf>> {
    let Some(parent) = path.parent() else {
        return Ok(Vec::new());
    };
    let missing: Vec<&Path> = parent
        .ancestors()
        .take_while(|dir| !dir.as_os_str().is_empty() && !dir.exists())
        .collect();

    let mut created = Vec::with_capacity(missing.len());
    for dir in missing.into_iter().rev() {
        match std::fs::create_dir(dir) {
            Ok(()) => created.push(dir.to_path_buf()),
            // Lost a race with another writer; theirs is as good as ours.
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && dir.is_dir() => {}
            Err(e) => {
                return Err(e).with_context(|| format!("create directory: {}", dir.display()));
            }
        }
    }
    Ok(created)
}

/// Replace `path` with `content` via a sibling temporary file and a rename.
///
/// Readers see either the old file or the new one, never a partial write.
/// The result always has mode [`FILE_MODE`], whatever the umask. The
/// temporary file is removed if any step fails.
///
/// # Errors
///
/// Returns the underlying I/O error from create, write, sync, or rename.
pub fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    let tmp = temp_path(path);
    let result = (|| {
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(FILE_MODE)
            .open(&tmp)?;
        file.write_all(content.as_bytes())?;
        file.set_permissions(std::fs::Permissions::from_mode(FILE_MODE))?;
        file.sync_all()?;
        std::fs::rename(&tmp, path)
    })();
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(format!(".tmp.{}", std::process::id()));
    path.with_file_name(name)
}

/// Expand a leading `~/` (or a lone `~`) against `home`.
#[must_use]
pub fn expand_home(raw: &str, home: &Path) -> PathBuf {
    if raw == "~" {
        home.to_path_buf()
    } else if let Some(rest) = raw.strip_prefix("~/") {
        home.join(rest)
    } else {
        PathBuf::from(raw)
    }
}
