//! The [`Logger`] the CLI hands to the engine.
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Mutex;

use super::subscriber::{DRY_RUN_TARGET, STAGE_TARGET};
use super::types::{Log, TaskEntry, TaskStatus};
use super::utils::log_file_path;

/// Emits through `tracing` and collects step results for the summary
/// printed at the end of `apply`.
///
/// Output formatting and the per-command log file belong to the subscriber
/// from [`init_subscriber`](super::init_subscriber); without one installed
/// the messages go nowhere but steps are still recorded.
#[derive(Debug)]
pub struct Logger {
    tasks: Mutex<Vec<TaskEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Logger for `command`; the name picks the log file.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            tasks: Mutex::default(),
            log_file: log_file_path(command),
        }
    }

    /// File the subscriber appends to for this command.
    #[must_use]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Snapshot of the steps recorded so far.
    #[must_use]
    pub fn tasks(&self) -> Vec<TaskEntry> {
        self.tasks.lock().map(|t| t.clone()).unwrap_or_default()
    }

    /// Failed step.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Non-fatal problem such as a merge conflict.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Section header.
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Progress line.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Detail shown on the console only with `--verbose`.
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Write that a dry run suppressed.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    /// Remember a step for [`print_summary`](Self::print_summary).
    pub fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.push(TaskEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// Steps recorded as [`TaskStatus::Failed`].
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.tasks()
            .iter()
            .filter(|t| t.status == TaskStatus::Failed)
            .count()
    }

    /// One line per recorded step, then totals by status.
    pub fn print_summary(&self) {
        let tasks = self.tasks();
        if tasks.is_empty() {
            return;
        }
        self.stage("Summary");

        for task in &tasks {
            let (glyph, colour) = task.status.glyph();
            let detail = task
                .message
                .as_deref()
                .map_or_else(String::new, |m| format!(" ({m})"));
            self.info(&format!("{colour}{glyph} {}{detail}\x1b[0m", task.name));
        }

        let mut totals = format!("{} steps:", tasks.len());
        for (i, status) in TaskStatus::ALL.into_iter().enumerate() {
            let count = tasks.iter().filter(|t| t.status == status).count();
            let sep = if i == 0 { " " } else { ", " };
            let (_, colour) = status.glyph();
            let _ = write!(totals, "{sep}{colour}{count} {}\x1b[0m", status.label());
        }
        self.info(&totals);

        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

impl Log for Logger {
    fn stage(&self, msg: &str) {
        Self::stage(self, msg);
    }

    fn info(&self, msg: &str) {
        Self::info(self, msg);
    }

    fn debug(&self, msg: &str) {
        Self::debug(self, msg);
    }

    fn warn(&self, msg: &str) {
        Self::warn(self, msg);
    }

    fn error(&self, msg: &str) {
        Self::error(self, msg);
    }

    fn dry_run(&self, msg: &str) {
        Self::dry_run(self, msg);
    }

    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        Self::record_task(self, name, status, message);
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::isolated_logger;

    fn log_contents(log: &Logger) -> String {
        std::fs::read_to_string(log.log_path().expect("log path")).unwrap()
    }

    #[test]
    fn steps_are_recorded_in_order() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_task("resolve", TaskStatus::Ok, None);
        log.record_task("shell: fish", TaskStatus::Skipped, Some("not supported"));
        let tasks = log.tasks();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].name, "shell: fish");
        assert_eq!(tasks[1].message.as_deref(), Some("not supported"));
    }

    #[test]
    fn counts_failures() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_task("persist", TaskStatus::Failed, Some("locked"));
        log.record_task("shell: bash", TaskStatus::Failed, Some("denied"));
        log.record_task("shell: zsh", TaskStatus::NotApplicable, None);
        assert_eq!(log.failure_count(), 2);
    }

    #[test]
    fn trait_object_records_steps() {
        let (log, _tmp, _guard) = isolated_logger();
        let sink: &dyn Log = &log;
        sink.record_task("merge", TaskStatus::Ok, Some("0 conflicts"));
        assert_eq!(log.tasks().len(), 1);
    }

    #[test]
    fn file_gets_every_level() {
        let (log, _tmp, _guard) = isolated_logger();
        log.stage("Apply");
        log.debug("resolved 3 modules");
        log.warn("alias ll redefined");
        log.dry_run("would update ~/.eee-env");
        let contents = log_contents(&log);
        assert!(contents.contains("==> Apply"));
        assert!(contents.contains("[debug] resolved 3 modules"));
        assert!(contents.contains("[warn] alias ll redefined"));
        assert!(contents.contains("[dry run] would update ~/.eee-env"));
    }

    #[test]
    fn summary_lists_steps_and_totals() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_task("persist", TaskStatus::Ok, Some("updated"));
        log.record_task("shell: fish", TaskStatus::Skipped, None);
        log.print_summary();
        let contents = log_contents(&log);
        assert!(contents.contains("✓ persist (updated)"));
        assert!(contents.contains("2 steps: 1 ok, 0 n/a, 1 skipped, 0 dry-run, 0 failed"));
        assert!(!contents.contains('\x1b'));
    }
}
