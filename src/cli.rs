//! Command-line surface: subcommands and their options.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI entry point for the shell-environment engine.
#[derive(Parser, Debug)]
#[command(
    name = "eee-env",
    about = "Idempotent shell-environment configuration engine",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Engine settings file (default: $XDG_CONFIG_HOME/eee-env/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Module definitions file (default: $XDG_CONFIG_HOME/eee-env/modules.toml)
    #[arg(long, global = true)]
    pub modules: Option<PathBuf>,

    /// Override the target home directory
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,

    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate the configuration file and integrate it with shells
    Apply,
    /// Check the on-disk configuration without changing it
    Validate,
    /// Show modules, resolution order, and integration status
    Inspect(InspectOpts),
    /// Print version information
    Version,
}

impl Command {
    /// Name used for the log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Apply => "apply",
            Self::Validate => "validate",
            Self::Inspect(_) => "inspect",
            Self::Version => "version",
        }
    }
}

/// Options for the `inspect` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct InspectOpts {
    /// Print machine-readable JSON
    #[arg(long)]
    pub json: bool,
}
