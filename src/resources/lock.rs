//! Advisory lock around the generated configuration file.
//!
//! The lock is a sibling file (`<config>.lock`) holding the owner's PID and
//! start time as JSON.  It is written to a private staging file first and
//! published with `link(2)`, so the lock path never exists half-written by
//! us.  A lock whose PID is no longer alive is stale and is replaced.
use std::fs;
use std::io::Read as _;
use std::os::unix::fs::MetadataExt as _;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;

/// How long an unreadable lock file is assumed to belong to a writer that
/// has not finished writing it.
const UNREADABLE_GRACE: Duration = Duration::from_secs(10);

/// Metadata stored in a lock file to identify the owning process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInfo {
    /// PID of the holder.
    pub pid: u32,
    /// RFC 3339 time the lock was taken.
    pub started: String,
}

/// Lock file path for `path`: the original path with `.lock` appended.
#[must_use]
pub fn lock_path_for(path: &Path) -> PathBuf {
    with_suffix(path, ".lock")
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// What sits at the lock path right now.
enum Holder {
    /// Nothing; it went away while we looked.
    Gone,
    /// A live process other than us.
    Live(u32),
    /// Unreadable and recent: someone is mid-write.
    Starting,
    /// Dead holder or abandoned garbage, identified by inode.
    Stale(u64),
}

impl Holder {
    fn inspect(lock_path: &Path, own_pid: u32) -> Result<Self> {
        let mut file = match fs::File::open(lock_path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::Gone),
            Err(e) => {
                return Err(e).with_context(|| format!("open lock file: {}", lock_path.display()));
            }
        };
        let meta = file
            .metadata()
            .with_context(|| format!("stat lock file: {}", lock_path.display()))?;
        let mut text = String::new();
        let parsed = file
            .read_to_string(&mut text)
            .ok()
            .and_then(|_| serde_json::from_str::<LockInfo>(&text).ok());

        Ok(match parsed {
            Some(info) if info.pid != own_pid && is_pid_alive(info.pid) => Self::Live(info.pid),
            Some(_) => Self::Stale(meta.ino()),
            None => {
                let age = meta
                    .modified()
                    .ok()
                    .and_then(|m| SystemTime::now().duration_since(m).ok())
                    .unwrap_or_default();
                if age < UNREADABLE_GRACE {
                    Self::Starting
                } else {
                    Self::Stale(meta.ino())
                }
            }
        })
    }
}

/// Held lock; the lock file is removed on drop.
#[derive(Debug)]
pub struct ConfigLock {
    lock_path: PathBuf,
}

impl ConfigLock {
    /// Take the lock for `path`.
    ///
    /// # Errors
    ///
    /// - [`PersistenceError::Locked`] if a live process holds the lock, or
    ///   an unreadable lock is younger than the grace period.
    /// - An I/O error if the lock file cannot be created.
    pub fn acquire(path: &Path) -> Result<Self> {
        let lock_path = lock_path_for(path);
        let info = LockInfo {
            pid: std::process::id(),
            started: chrono::Utc::now().to_rfc3339(),
        };
        let staged = with_suffix(&lock_path, &format!(".{}", info.pid));
        let json = serde_json::to_string(&info).context("serialize lock info")?;
        fs::write(&staged, json)
            .with_context(|| format!("write lock file: {}", staged.display()))?;

        let taken = Self::publish(path, &lock_path, &staged, info.pid);
        let _ = fs::remove_file(&staged);
        taken
    }

    fn publish(path: &Path, lock_path: &Path, staged: &Path, own_pid: u32) -> Result<Self> {
        let locked = |pid| PersistenceError::Locked {
            path: path.display().to_string(),
            pid,
            lock: lock_path.display().to_string(),
        };

        for _ in 0..3 {
            match fs::hard_link(staged, lock_path) {
                Ok(()) => {
                    return Ok(Self {
                        lock_path: lock_path.to_path_buf(),
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    match Holder::inspect(lock_path, own_pid)? {
                        Holder::Gone => {}
                        Holder::Live(pid) => return Err(locked(Some(pid)).into()),
                        Holder::Starting => return Err(locked(None).into()),
                        Holder::Stale(ino) => evict(lock_path, ino, own_pid)?,
                    }
                }
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("create lock file: {}", lock_path.display()));
                }
            }
        }
        anyhow::bail!("could not take lock {}", lock_path.display())
    }
}

/// Move the stale lock with inode `ino` out of the way.
///
/// The lock is renamed aside rather than unlinked so that a fresh lock
/// published after [`Holder::inspect`] looked is never deleted: if the
/// renamed file is not the one judged stale it is linked back.
fn evict(lock_path: &Path, ino: u64, own_pid: u32) -> Result<()> {
    let aside = with_suffix(lock_path, &format!(".stale.{own_pid}"));
    match fs::rename(lock_path, &aside) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(e).with_context(|| format!("remove stale lock: {}", lock_path.display()));
        }
    }
    let moved = fs::metadata(&aside).map(|m| m.ino()).ok();
    if moved == Some(ino) {
        tracing::debug!("removed stale lock {}", lock_path.display());
    } else {
        let _ = fs::hard_link(&aside, lock_path);
    }
    fs::remove_file(&aside).with_context(|| format!("remove stale lock: {}", aside.display()))
}

impl Drop for ConfigLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// Check whether a process with the given PID is still running.
///
/// Uses `kill(pid, 0)`, which checks for existence without sending a signal.
/// A process owned by another user (EPERM) counts as alive.
#[allow(unsafe_code)]
pub(crate) fn is_pid_alive(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // SAFETY: signal 0 performs only the existence and permission check.
    let ret = unsafe { libc::kill(pid, 0) };
    if ret == 0 {
        return true;
    }
    std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn holder(config: &Path) -> LockInfo {
        serde_json::from_str(&fs::read_to_string(lock_path_for(config)).unwrap()).unwrap()
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn backdate(path: &Path, by: Duration) {
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(SystemTime::now() - by)
            .unwrap();
    }

    fn locked_pid(err: &anyhow::Error) -> Option<u32> {
        match err.downcast_ref::<PersistenceError>() {
            Some(PersistenceError::Locked { pid, .. }) => *pid,
            other => panic!("expected Locked, got {other:?}"),
        }
    }

    #[test]
    fn lock_path_appends_suffix() {
        assert_eq!(
            lock_path_for(Path::new("/home/dev/.eee-env")),
            PathBuf::from("/home/dev/.eee-env.lock")
        );
    }

    #[test]
    fn acquire_publishes_pid_and_drop_removes() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join(".eee-env");
        {
            let _lock = ConfigLock::acquire(&config).unwrap();
            let info = holder(&config);
            assert_eq!(info.pid, std::process::id());
            assert!(chrono::DateTime::parse_from_rfc3339(&info.started).is_ok());
            assert_eq!(entries(dir.path()), [".eee-env.lock"]);
        }
        assert!(entries(dir.path()).is_empty());
    }

    #[test]
    fn dead_holder_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join(".eee-env");
        // PIDs are capped well below i32::MAX on Linux.
        let stale = LockInfo {
            pid: 2_000_000_000,
            started: "2020-01-01T00:00:00+00:00".to_string(),
        };
        fs::write(lock_path_for(&config), serde_json::to_string(&stale).unwrap()).unwrap();

        let _lock = ConfigLock::acquire(&config).unwrap();
        assert_eq!(holder(&config).pid, std::process::id());
        assert_eq!(entries(dir.path()), [".eee-env.lock"]);
    }

    #[test]
    fn half_written_lock_is_respected() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join(".eee-env");
        fs::write(lock_path_for(&config), "").unwrap();

        let err = ConfigLock::acquire(&config).unwrap_err();
        assert_eq!(locked_pid(&err), None);
        assert_eq!(fs::read_to_string(lock_path_for(&config)).unwrap(), "");
        assert_eq!(entries(dir.path()), [".eee-env.lock"]);
    }

    #[test]
    fn abandoned_garbage_lock_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join(".eee-env");
        let lock = lock_path_for(&config);
        fs::write(&lock, "not json").unwrap();
        backdate(&lock, UNREADABLE_GRACE * 6);

        let _lock = ConfigLock::acquire(&config).unwrap();
        assert_eq!(holder(&config).pid, std::process::id());
    }

    #[test]
    fn eviction_puts_back_a_lock_that_changed_underneath() {
        let dir = tempfile::tempdir().unwrap();
        let lock = dir.path().join(".eee-env.lock");
        fs::write(&lock, "fresh holder").unwrap();
        let wrong_ino = fs::metadata(&lock).unwrap().ino() + 1;

        evict(&lock, wrong_ino, std::process::id()).unwrap();
        assert_eq!(fs::read_to_string(&lock).unwrap(), "fresh holder");
        assert_eq!(entries(dir.path()), [".eee-env.lock"]);
    }

    #[test]
    fn live_lock_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join(".eee-env");
        let mut child = std::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .unwrap();
        let held = LockInfo {
            pid: child.id(),
            started: chrono::Utc::now().to_rfc3339(),
        };
        fs::write(lock_path_for(&config), serde_json::to_string(&held).unwrap()).unwrap();

        let err = ConfigLock::acquire(&config).unwrap_err();
        let _ = child.kill();
        let _ = child.wait();

        assert_eq!(locked_pid(&err), Some(held.pid));
        assert!(err.to_string().contains(".eee-env.lock"));
        assert_eq!(entries(dir.path()), [".eee-env.lock"]);
    }

    #[test]
    fn current_process_is_alive() {
        assert!(is_pid_alive(std::process::id()));
    }
}
