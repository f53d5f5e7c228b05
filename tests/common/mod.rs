// Shared helpers for integration tests.
//
// Provides a temporary home directory and a fluent builder so each
// integration test can run the engine in isolation without repeating
// filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::os::unix::fs::MetadataExt as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use eee_env::config::Settings;
use eee_env::engine::{Context, EnvManager};
use eee_env::exec::SystemExecutor;
use eee_env::logging::{Log, Logger, TaskStatus};
use eee_env::resources::ownership::{Identity, Ownership};

/// An isolated home directory backed by a [`tempfile::TempDir`].
///
/// The directory is deleted when dropped.
pub struct TestHome {
    pub dir: tempfile::TempDir,
    pub settings: Settings,
    pub log: Arc<Logger>,
    pub dry_run: bool,
}

impl TestHome {
    /// A home with default settings.
    pub fn new() -> Self {
        TestHomeBuilder::new().build()
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the generated configuration file.
    pub fn config_path(&self) -> PathBuf {
        self.settings.config_path(self.path())
    }

    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.path().join(name)).expect("read file in test home")
    }

    pub fn write(&self, name: &str, content: &str) {
        std::fs::write(self.path().join(name), content).expect("write file in test home");
    }

    /// Files in the home directory, sorted by name.
    pub fn entries(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.path())
            .expect("list test home")
            .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Context targeting the current user, who owns the temporary home.
    pub fn context(&self) -> Context {
        let uid = std::fs::metadata(self.path()).expect("stat home").uid();
        let gid = std::fs::metadata(self.path()).expect("stat home").gid();
        let ownership = Ownership::new(
            Identity {
                name: "tester".to_string(),
                uid,
                gid,
            },
            uid,
            Arc::new(SystemExecutor),
        );
        let log: Arc<dyn Log> = self.log.clone();
        Context::with_ownership(
            self.settings.clone(),
            self.path().to_path_buf(),
            log,
            ownership,
            self.dry_run,
        )
    }

    /// A fresh manager with an empty registry.
    pub fn manager(&self) -> EnvManager {
        EnvManager::new(self.context())
    }

    /// Names of recorded steps with the given status.
    pub fn steps_with(&self, status: TaskStatus) -> Vec<String> {
        self.log
            .tasks()
            .into_iter()
            .filter(|t| t.status == status)
            .map(|t| t.name)
            .collect()
    }
}

/// Fluent builder for [`TestHome`].
pub struct TestHomeBuilder {
    settings: Settings,
    dry_run: bool,
}

impl TestHomeBuilder {
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
            dry_run: false,
        }
    }

    pub fn config_file(mut self, path: &str) -> Self {
        self.settings.config_file = path.to_string();
        self
    }

    pub fn max_backups(mut self, max: usize) -> Self {
        self.settings.backup.max_backups = max;
        self
    }

    pub fn fish(mut self, enabled: bool) -> Self {
        self.settings.shells.fish = enabled;
        self
    }

    pub fn zsh(mut self, enabled: bool) -> Self {
        self.settings.shells.zsh = enabled;
        self
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn build(self) -> TestHome {
        TestHome {
            dir: tempfile::tempdir().expect("create temp home"),
            settings: self.settings,
            log: Arc::new(Logger::new("test")),
            dry_run: self.dry_run,
        }
    }
}
