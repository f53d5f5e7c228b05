//! Log file location, timestamps and ANSI removal.
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

/// CSI sequences (`ESC [ params final`) and two-byte escapes.
#[allow(clippy::unwrap_used)]
static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b(?:\[[0-?]*[ -/]*[@-~]|[@-Z\\-_])").unwrap());

/// `msg` without terminal escape codes, for the log file.
pub(super) fn strip_ansi(msg: &str) -> String {
    ANSI_ESCAPE.replace_all(msg, "").into_owned()
}

/// `<cache>/eee-env/<command>.log`, where `<cache>` is `$XDG_CACHE_HOME` or
/// `~/.cache`. The directory is created on demand; `None` if that fails or
/// neither variable is set.
pub(super) fn log_file_path(command: &str) -> Option<PathBuf> {
    let cache = std::env::var_os("XDG_CACHE_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".cache")))?;
    let dir = cache.join("eee-env");
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir.join(format!("{command}.log")))
}

/// Run header timestamp, UTC.
pub(super) fn format_utc_datetime() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Per-line timestamp, UTC.
pub(super) fn format_utc_time() -> String {
    chrono::Utc::now().format("%H:%M:%S").to_string()
}
