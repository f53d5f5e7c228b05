//! Command: show modules, resolution order and integration status.
use std::sync::Arc;

use anyhow::Result;

use super::CommandSetup;
use crate::cli::{GlobalOpts, InspectOpts};
use crate::engine::EnvironmentInfo;
use crate::logging::Logger;
use crate::resources::ResourceState;

/// Run the inspect command.
///
/// # Errors
///
/// Returns an error if configuration loading or module resolution fails.
#[allow(clippy::print_stdout)]
pub fn run(global: &GlobalOpts, opts: &InspectOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let info = setup.manager.environment_info()?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print!("{}", render_text(&info));
    }
    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn state_label(state: &ResourceState) -> String {
    match state {
        ResourceState::Missing => "missing".to_string(),
        ResourceState::Correct => "integrated".to_string(),
        ResourceState::Incorrect { .. } => "not integrated".to_string(),
        ResourceState::Invalid { reason } => reason.clone(),
    }
}

/// Plain-text report for terminals.
fn render_text(info: &EnvironmentInfo) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    let _ = writeln!(out, "user:        {}", info.target_user);
    let _ = writeln!(out, "home:        {}", info.home.display());
    let _ = writeln!(out, "config file: {}", info.config_path.display());
    let _ = writeln!(out, "  exists:    {}", yes_no(info.config_exists));
    let _ = writeln!(out, "  current:   {}", yes_no(info.up_to_date));
    let _ = writeln!(out, "  sha256:    {}", info.digest);

    let _ = writeln!(out, "modules ({}):", info.modules.len());
    for module in &info.modules {
        let _ = write!(out, "  {} (priority {})", module.name, module.priority);
        if !module.dependencies.is_empty() {
            let _ = write!(out, " <- {}", module.dependencies.join(", "));
        }
        if !module.description.is_empty() {
            let _ = write!(out, ": {}", module.description);
        }
        out.push('\n');
    }
    let _ = writeln!(out, "order:       {}", info.resolved_order.join(" -> "));

    let _ = writeln!(out, "shells:");
    for status in &info.shells {
        let state = if status.enabled {
            state_label(&status.state)
        } else {
            "disabled".to_string()
        };
        let _ = writeln!(out, "  {:<5} {state}", status.shell.to_string());
    }

    if !info.conflicts.is_empty() {
        let _ = writeln!(out, "conflicts:");
        for conflict in &info.conflicts {
            let _ = writeln!(out, "  {conflict}");
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::engine::validate::{ModuleSummary, ShellStatus};
    use crate::resources::shell_rc::Shell;

    fn sample() -> EnvironmentInfo {
        EnvironmentInfo {
            target_user: "alice".to_string(),
            home: PathBuf::from("/home/alice"),
            config_path: PathBuf::from("/home/alice/.eee-env"),
            config_exists: true,
            up_to_date: false,
            digest: "ab".repeat(32),
            modules: vec![
                ModuleSummary {
                    name: "base".to_string(),
                    description: "Core tools".to_string(),
                    priority: 10,
                    dependencies: vec![],
                },
                ModuleSummary {
                    name: "go".to_string(),
                    description: String::new(),
                    priority: 100,
                    dependencies: vec!["base".to_string()],
                },
            ],
            resolved_order: vec!["base".to_string(), "go".to_string()],
            shells: vec![
                ShellStatus {
                    shell: Shell::Bash,
                    enabled: true,
                    rc_file: Some(PathBuf::from("/home/alice/.bashrc")),
                    state: ResourceState::Correct,
                },
                ShellStatus {
                    shell: Shell::Fish,
                    enabled: false,
                    rc_file: None,
                    state: ResourceState::Invalid {
                        reason: "fish integration is not supported".to_string(),
                    },
                },
            ],
            conflicts: vec![],
        }
    }

    #[test]
    fn text_report() {
        insta::assert_snapshot!(render_text(&sample()), @r"
        user:        alice
        home:        /home/alice
        config file: /home/alice/.eee-env
          exists:    yes
          current:   no
          sha256:    abababababababababababababababababababababababababababababababab
        modules (2):
          base (priority 10): Core tools
          go (priority 100) <- base
        order:       base -> go
        shells:
          bash  integrated
          fish  disabled
        ");
    }
}
