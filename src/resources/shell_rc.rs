//! Shell startup file integration.
//!
//! Appends a block to `~/.bashrc` / `~/.zshrc` that sources the generated
//! configuration file.  Integration is additive only.
use std::fmt;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::Serialize;

use super::ownership::Ownership;
use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::error::ShellIntegrationError;

/// Label line that marks an installed block.
pub const MARKER: &str = "# EEE Development Environment";

/// Shells the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shell {
    /// Integrated through `~/.bashrc`.
    Bash,
    /// Integrated through `~/.zshrc`.
    Zsh,
    /// Reserved; never integrated.
    Fish,
}

impl Shell {
    /// Startup file name under the home directory, if the shell is supported.
    #[must_use]
    pub const fn rc_file(self) -> Option<&'static str> {
        match self {
            Self::Bash => Some(".bashrc"),
            Self::Zsh => Some(".zshrc"),
            Self::Fish => None,
        }
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bash => "bash",
            Self::Zsh => "zsh",
            Self::Fish => "fish",
        })
    }
}

/// The block appended to a startup file.
#[must_use]
pub fn source_block(config_path: &Path) -> String {
    let path = config_path.display();
    format!("{MARKER}\nif [ -f \"{path}\" ]; then\n  source \"{path}\"\nfi\n")
}

/// Whether `content` already sources `config_path`.
///
/// Only an uncommented `source <path>` or `. <path>` line for this exact
/// path counts; a marker block sourcing some earlier location does not.
#[must_use]
pub fn is_integrated(content: &str, config_path: &Path) -> bool {
    let wanted = config_path.display().to_string();
    content.lines().any(|line| {
        let line = line.trim();
        line.strip_prefix("source ")
            .or_else(|| line.strip_prefix(". "))
            .is_some_and(|target| target.trim().trim_matches(['"', '\'']) == wanted)
    })
}

/// One shell's startup file, made to source the generated configuration.
#[derive(Debug)]
pub struct ShellRcResource<'a> {
    /// Which shell.
    pub shell: Shell,
    /// Startup file path; `None` for unsupported shells.
    pub rc_path: Option<PathBuf>,
    /// Generated configuration file to source.
    pub config_path: PathBuf,
    ownership: &'a Ownership,
}

impl<'a> ShellRcResource<'a> {
    /// Resource for `shell` under `home`.
    #[must_use]
    pub fn new(shell: Shell, home: &Path, config_path: PathBuf, ownership: &'a Ownership) -> Self {
        Self {
            shell,
            rc_path: shell.rc_file().map(|f| home.join(f)),
            config_path,
            ownership,
        }
    }

    fn read(path: &Path) -> Result<Option<String>> {
        match std::fs::read_to_string(path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
        }
    }
}

impl Applicable for ShellRcResource<'_> {
    fn description(&self) -> String {
        self.rc_path.as_ref().map_or_else(
            || format!("{} (unsupported)", self.shell),
            |p| p.display().to_string(),
        )
    }

    fn apply(&self) -> Result<ResourceChange> {
        let Some(rc_path) = &self.rc_path else {
            return Ok(ResourceChange::Skipped {
                reason: format!("{} integration is not supported", self.shell),
            });
        };

        let existing = Self::read(rc_path)?;
        if existing
            .as_deref()
            .is_some_and(|c| is_integrated(c, &self.config_path))
        {
            return Ok(ResourceChange::AlreadyCorrect);
        }

        if existing.is_none() {
            std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(rc_path)
                .map_err(|source| ShellIntegrationError::Create {
                    path: rc_path.display().to_string(),
                    source,
                })?;
            tracing::debug!("created {}", rc_path.display());
        }
        self.ownership.ensure_owner(rc_path)?;

        // Keep the block separated from whatever precedes it.
        let mut block = String::new();
        match existing.as_deref() {
            None | Some("") => {}
            Some(c) if c.ends_with('\n') => block.push('\n'),
            Some(_) => block.push_str("\n\n"),
        }
        block.push_str(&source_block(&self.config_path));

        std::fs::OpenOptions::new()
            .append(true)
            .open(rc_path)
            .and_then(|mut f| f.write_all(block.as_bytes()))
            .map_err(|source| ShellIntegrationError::Append {
                path: rc_path.display().to_string(),
                source,
            })?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for ShellRcResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        let Some(rc_path) = &self.rc_path else {
            return Ok(ResourceState::Invalid {
                reason: format!("{} integration is not supported", self.shell),
            });
        };
        Ok(match Self::read(rc_path)? {
            None => ResourceState::Missing,
            Some(c) if is_integrated(&c, &self.config_path) => ResourceState::Correct,
            Some(_) => ResourceState::Incorrect {
                current: format!("{} does not source {}", rc_path.display(), self.config_path.display()),
            },
        })
    }
}
