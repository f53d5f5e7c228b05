//! External commands: identity lookups (`id`, `getent`) and ownership
//! repair (`sudo -n chown`).
use anyhow::{Context, Result, bail};
use std::process::Command;

/// Captured output of a command that exited zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output, lossily decoded.
    pub stdout: String,
}

/// Runs external programs on behalf of the engine.
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run `program` with `args` and capture its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be spawned or exits non-zero;
    /// the message carries the exit code and trimmed stderr.
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput>;
}

/// [`Executor`] that spawns real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("failed to execute: {program}"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            bail!("{program} exited with {code}: {}", stderr.trim());
        }
        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout() {
        let out = SystemExecutor.run("id", &["-u"]).unwrap();
        assert!(out.stdout.trim().parse::<u32>().is_ok());
    }

    #[test]
    fn non_zero_exit_reports_code() {
        let err = SystemExecutor.run("false", &[]).unwrap_err();
        assert!(err.to_string().starts_with("false exited with 1"));
    }

    #[test]
    fn missing_program_is_error() {
        let err = SystemExecutor
            .run("eee-env-no-such-program", &[])
            .unwrap_err();
        assert!(err.to_string().contains("failed to execute"));
    }
}
