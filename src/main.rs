//! `eee-env` binary: parses arguments, installs logging and dispatches.
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use eee_env::cli::{Cli, Command};
use eee_env::commands;
use eee_env::logging::{Logger, init_subscriber};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    if matches!(args.command, Command::Version) {
        commands::version::run();
        return Ok(());
    }

    let command = args.command.name();
    init_subscriber(args.verbose, command);
    let log = Arc::new(Logger::new(command));

    match &args.command {
        Command::Apply => commands::apply::run(&args.global, &log),
        Command::Validate => commands::validate::run(&args.global, &log),
        Command::Inspect(opts) => commands::inspect::run(&args.global, opts, &log),
        Command::Version => Ok(()),
    }
}
