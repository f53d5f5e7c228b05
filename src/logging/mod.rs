//! Console and log-file output built on `tracing`, plus the step summary.

mod logger;
mod subscriber;
mod types;
mod utils;

pub use logger::Logger;
pub use subscriber::init_subscriber;
pub use types::{Log, TaskEntry, TaskStatus};

/// Held by any test that touches `XDG_CACHE_HOME`.
#[cfg(test)]
pub(crate) static TEST_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Run `f` with `XDG_CACHE_HOME` pointing at `dir`.
#[cfg(test)]
#[allow(unsafe_code)]
pub(crate) fn with_cache_home<T>(dir: &std::path::Path, f: impl FnOnce() -> T) -> T {
    let _lock = TEST_ENV_MUTEX
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    // SAFETY: every test that touches the environment holds TEST_ENV_MUTEX.
    unsafe { std::env::set_var("XDG_CACHE_HOME", dir) };
    let out = f();
    // SAFETY: as above.
    unsafe { std::env::remove_var("XDG_CACHE_HOME") };
    out
}

/// A [`Logger`] whose events land in a fresh temporary log file.
///
/// Installs a thread-local subscriber carrying only the file layer; keep the
/// guard alive for the whole test.
#[cfg(test)]
#[allow(clippy::expect_used)]
pub(crate) fn isolated_logger() -> (Logger, tempfile::TempDir, tracing::dispatcher::DefaultGuard) {
    use tracing_subscriber::{Layer as _, filter::LevelFilter, layer::SubscriberExt as _};

    let tmp = tempfile::tempdir().expect("temp cache dir");
    let (layer, log) = with_cache_home(tmp.path(), || {
        (subscriber::FileLayer::new("test"), Logger::new("test"))
    });
    let layer = layer.expect("log file in temp cache");
    let dispatch = tracing::Dispatch::new(
        tracing_subscriber::registry().with(layer.with_filter(LevelFilter::DEBUG)),
    );
    let guard = tracing::dispatcher::set_default(&dispatch);
    (log, tmp, guard)
}
