//! Files the engine manages: the generated script and shell startup blocks.
pub mod backup;
pub mod config_file;
pub mod fs;
pub mod lock;
pub mod ownership;
pub mod shell_rc;

use anyhow::Result;

/// Something the engine can bring into its desired state.
pub trait Applicable {
    /// Label used in log lines, e.g. `~/.bashrc integration`.
    fn description(&self) -> String;

    /// Bring the resource into its desired state.
    ///
    /// Parent directories are created as needed. Calling this on a resource
    /// that is already correct must not touch the filesystem.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure, an ownership problem, or when another
    /// writer holds the lock.
    fn apply(&self) -> Result<ResourceChange>;
}

/// What is on disk compared to what the engine would write.
///
/// # Examples
///
/// ```
/// use eee_env::resources::ResourceState;
///
/// let stale = ResourceState::Incorrect { current: "content differs".into() };
/// assert!(stale.is_pending());
/// assert!(!ResourceState::Correct.is_pending());
/// assert!(!ResourceState::Invalid { reason: "fish".into() }.is_pending());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ResourceState {
    /// Nothing there yet.
    Missing,
    /// Matches byte for byte.
    Correct,
    /// Present but different.
    Incorrect {
        /// What differs.
        current: String,
    },
    /// Cannot be managed at all (unsupported shell, unreadable file).
    Invalid {
        /// Why it is unmanageable.
        reason: String,
    },
}

impl ResourceState {
    /// Whether an apply would write something.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Missing | Self::Incorrect { .. })
    }
}

/// Outcome of [`Applicable::apply`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum ResourceChange {
    /// Written.
    Applied,
    /// Left alone; content already matched.
    AlreadyCorrect,
    /// Not attempted.
    Skipped {
        /// Why it was skipped.
        reason: String,
    },
}

/// A resource whose state can be inspected without side effects.
///
/// The validator and `inspect` only ever call [`current_state`](Self::current_state).
pub trait Resource: Applicable {
    /// Compare what is on disk with the desired state.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    fn current_state(&self) -> Result<ResourceState>;
}
