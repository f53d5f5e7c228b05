//! Step records and the [`Log`] sink the engine writes through.

/// One finished step of a run, e.g. `persist` or `shell: zsh`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntry {
    /// Step name.
    pub name: String,
    /// How it ended.
    pub status: TaskStatus,
    /// Detail shown in parentheses in the summary.
    pub message: Option<String>,
}

/// How a step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Done, whether or not anything changed.
    Ok,
    /// Turned off in settings (a disabled shell).
    NotApplicable,
    /// Could not be handled, e.g. fish.
    Skipped,
    /// Would have written something.
    DryRun,
    /// Errored; the run continues with the next step.
    Failed,
}

impl TaskStatus {
    /// Summary order.
    pub const ALL: [Self; 5] = [
        Self::Ok,
        Self::NotApplicable,
        Self::Skipped,
        Self::DryRun,
        Self::Failed,
    ];

    /// Summary glyph and its ANSI colour.
    #[must_use]
    pub const fn glyph(self) -> (&'static str, &'static str) {
        match self {
            Self::Ok => ("✓", "\x1b[32m"),
            Self::NotApplicable => ("·", "\x1b[2m"),
            Self::Skipped => ("○", "\x1b[33m"),
            Self::DryRun => ("~", "\x1b[37m"),
            Self::Failed => ("✗", "\x1b[31m"),
        }
    }

    /// Word used in the summary totals line.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NotApplicable => "n/a",
            Self::Skipped => "skipped",
            Self::DryRun => "dry-run",
            Self::Failed => "failed",
        }
    }
}

/// Where the engine sends progress.
///
/// [`Logger`](super::Logger) is the only production sink; the engine holds
/// it as `Arc<dyn Log>`.
pub trait Log: Send + Sync {
    /// Section header such as `Apply`.
    fn stage(&self, msg: &str);
    /// Progress line.
    fn info(&self, msg: &str);
    /// Console only with `--verbose`; always in the log file.
    fn debug(&self, msg: &str);
    /// Non-fatal problem.
    fn warn(&self, msg: &str);
    /// Failed step.
    fn error(&self, msg: &str);
    /// Something that would have been written outside a dry run.
    fn dry_run(&self, msg: &str);
    /// Remember a step for the closing summary.
    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_distinct() {
        let labels: std::collections::HashSet<_> =
            TaskStatus::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(labels.len(), TaskStatus::ALL.len());
    }

    #[test]
    fn failure_is_red() {
        assert_eq!(TaskStatus::Failed.glyph(), ("✗", "\x1b[31m"));
    }
}
