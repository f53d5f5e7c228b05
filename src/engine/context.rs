//! Per-run [`Context`]: settings, target home, logger and ownership.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::config::Settings;
use crate::exec::Executor;
use crate::logging::Log;
use crate::resources::ownership::{self, Identity, Ownership};

/// Everything one configuration run needs besides the modules themselves.
pub struct Context {
    /// Loaded settings.
    pub settings: Settings,
    /// Home directory of the target user.
    pub home: PathBuf,
    /// Logger for output and step recording.
    pub log: Arc<dyn Log>,
    /// Whether to preview changes without writing anything.
    pub dry_run: bool,
    /// Ownership policy for every written file.
    pub ownership: Ownership,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("settings", &self.settings)
            .field("home", &self.home)
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .field("ownership", &self.ownership)
            .finish()
    }
}

impl Context {
    /// Build a context for the current process.
    ///
    /// The target user comes from the settings (or `SUDO_USER`/`USER`).  The
    /// home directory is `home` when given; otherwise the target user's
    /// passwd home when running as root for another user, else `$HOME`.
    ///
    /// # Errors
    ///
    /// Returns an error if the target user cannot be determined or resolved,
    /// or no home directory can be found.
    pub fn new(
        settings: Settings,
        home: Option<PathBuf>,
        log: Arc<dyn Log>,
        executor: Arc<dyn Executor>,
        dry_run: bool,
    ) -> Result<Self> {
        let user = settings
            .target_user_name()
            .context("cannot determine target user; set target_user in config.toml")?;
        let target = Identity::lookup(&user, executor.as_ref())?;
        let euid = ownership::effective_uid(executor.as_ref())?;

        let home = match home {
            Some(home) => home,
            None if euid == 0 && target.uid != 0 => ownership::home_of(&user, executor.as_ref())?,
            None => std::env::var_os("HOME")
                .map(PathBuf::from)
                .context("HOME environment variable is not set")?,
        };

        log.debug(&format!(
            "target user {} (uid {}), home {}, effective uid {euid}",
            target.name,
            target.uid,
            home.display()
        ));

        Ok(Self {
            settings,
            home,
            log,
            dry_run,
            ownership: Ownership::new(target, euid, executor),
        })
    }

    /// Build a context from already-resolved parts.
    #[must_use]
    pub fn with_ownership(
        settings: Settings,
        home: PathBuf,
        log: Arc<dyn Log>,
        ownership: Ownership,
        dry_run: bool,
    ) -> Self {
        Self {
            settings,
            home,
            log,
            dry_run,
            ownership,
        }
    }

    /// Absolute path of the generated configuration file.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.settings.config_path(&self.home)
    }

    /// Home directory of the target user.
    #[must_use]
    pub fn home(&self) -> &Path {
        &self.home
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::logging::Logger;
    use crate::resources::test_helpers::MockExecutor;

    fn settings_for(user: &str) -> Settings {
        Settings {
            target_user: Some(user.to_string()),
            ..Settings::default()
        }
    }

    #[test]
    fn explicit_home_wins() {
        let executor = Arc::new(MockExecutor::replies(&["1000", "1000", "0"]));
        let ctx = Context::new(
            settings_for("alice"),
            Some(PathBuf::from("/srv/alice")),
            Arc::new(Logger::new("test")),
            executor.clone(),
            false,
        )
        .unwrap();
        assert_eq!(ctx.home(), Path::new("/srv/alice"));
        assert_eq!(ctx.config_path(), PathBuf::from("/srv/alice/.eee-env"));
        assert_eq!(ctx.ownership.target().uid, 1000);
        assert_eq!(executor.call_count(), 3);
    }

    #[test]
    fn root_run_for_other_user_uses_passwd_home() {
        let executor = Arc::new(MockExecutor::replies(&[
            "1000",
            "1000",
            "0",
            "alice:x:1000:1000::/home/alice:/bin/zsh",
        ]));
        let ctx = Context::new(
            settings_for("alice"),
            None,
            Arc::new(Logger::new("test")),
            executor.clone(),
            false,
        )
        .unwrap();
        assert_eq!(ctx.home(), Path::new("/home/alice"));
        assert_eq!(
            executor.calls().last().map(String::as_str),
            Some("getent passwd alice")
        );
    }

    #[test]
    fn unknown_target_user_fails() {
        let result = Context::new(
            settings_for("ghost"),
            Some(PathBuf::from("/tmp")),
            Arc::new(Logger::new("test")),
            Arc::new(MockExecutor::fail()),
            false,
        );
        assert!(result.is_err());
    }
}
