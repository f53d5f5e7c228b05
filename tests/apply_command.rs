#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for applying an environment.
//!
//! These drive [`EnvManager::apply_configuration`] against a temporary home
//! directory and check the generated file and shell startup files.

mod common;

use common::{TestHome, TestHomeBuilder};
use eee_env::config::modules_file;
use eee_env::error::ModuleError;
use eee_env::installer::{StaticModules, run_installers};
use eee_env::logging::TaskStatus;
use eee_env::modules::EnvModule;
use eee_env::resources::ResourceChange;
use eee_env::resources::shell_rc::MARKER;

// ---------------------------------------------------------------------------
// Idempotence
// ---------------------------------------------------------------------------

#[test]
fn second_apply_writes_nothing() {
    let home = TestHome::new();
    let mut mgr = home.manager();
    mgr.add_module(
        EnvModule::new("base")
            .env("EDITOR", "vim")
            .path("/opt/x/bin")
            .alias("ll", "ls -la"),
    )
    .unwrap();

    mgr.apply_configuration().unwrap();
    let path = home.config_path();
    let first = std::fs::read(&path).unwrap();
    let modified = std::fs::metadata(&path).unwrap().modified().unwrap();
    let bashrc = home.read(".bashrc");

    let report = mgr.apply_configuration().unwrap();
    assert!(!report.changed());
    assert_eq!(report.config_change, ResourceChange::AlreadyCorrect);
    assert_eq!(std::fs::read(&path).unwrap(), first);
    assert_eq!(std::fs::metadata(&path).unwrap().modified().unwrap(), modified);
    assert_eq!(home.read(".bashrc"), bashrc);
    assert_eq!(home.entries(), [".bashrc", ".eee-env", ".zshrc"]);
}

#[test]
fn shell_block_is_added_once() {
    let home = TestHome::new();
    home.write(".bashrc", "");
    let mgr = home.manager();

    mgr.apply_configuration().unwrap();
    mgr.apply_configuration().unwrap();

    let bashrc = home.read(".bashrc");
    assert_eq!(bashrc.matches(MARKER).count(), 1);
    assert!(bashrc.contains(&format!(
        "source \"{}\"",
        home.config_path().display()
    )));
}

#[test]
fn existing_startup_content_is_preserved() {
    let home = TestHome::new();
    home.write(".zshrc", "setopt autocd");
    home.manager().apply_configuration().unwrap();

    let zshrc = home.read(".zshrc");
    assert!(zshrc.starts_with("setopt autocd\n\n"));
    assert!(zshrc.contains(MARKER));
}

// ---------------------------------------------------------------------------
// Generated content
// ---------------------------------------------------------------------------

#[test]
fn duplicate_path_rendered_once() {
    let home = TestHome::new();
    let mut mgr = home.manager();
    mgr.add_module(EnvModule::new("a").path("/opt/x/bin")).unwrap();
    mgr.add_module(EnvModule::new("b").path("/opt/x/bin").path("/opt/y/bin"))
        .unwrap();
    mgr.apply_configuration().unwrap();

    let content = home.read(".eee-env");
    assert_eq!(content.matches("*\":/opt/x/bin:\"*)").count(), 1);
    assert_eq!(content.matches("*\":/opt/y/bin:\"*)").count(), 1);
}

#[test]
fn higher_priority_number_overrides() {
    let home = TestHome::new();
    let mut mgr = home.manager();
    mgr.add_module(EnvModule::new("a").priority(10).env("FOO", "1"))
        .unwrap();
    mgr.add_module(EnvModule::new("b").priority(50).env("FOO", "2"))
        .unwrap();
    mgr.apply_configuration().unwrap();

    let content = home.read(".eee-env");
    assert!(content.contains("export FOO=\"2\"\n"));
    assert!(!content.contains("export FOO=\"1\""));
}

#[test]
fn dependency_overrides_regardless_of_priority() {
    let home = TestHome::new();
    let mut mgr = home.manager();
    mgr.add_module(EnvModule::new("base").priority(90).env("FOO", "base"))
        .unwrap();
    mgr.add_module(
        EnvModule::new("tool")
            .priority(1)
            .depends_on("base")
            .env("FOO", "tool"),
    )
    .unwrap();
    mgr.apply_configuration().unwrap();

    assert!(home.read(".eee-env").contains("export FOO=\"tool\"\n"));
}

#[test]
fn alias_conflict_does_not_fail() {
    let home = TestHome::new();
    let mut mgr = home.manager();
    mgr.add_module(EnvModule::new("a").priority(10).alias("ll", "ls -l"))
        .unwrap();
    mgr.add_module(EnvModule::new("b").priority(20).alias("ll", "ls -la"))
        .unwrap();

    let report = mgr.apply_configuration().unwrap();
    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.conflicts[0].module, "b");
    assert!(home.read(".eee-env").contains("alias ll='ls -la'\n"));
    assert!(home.steps_with(TaskStatus::Failed).is_empty());
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[test]
fn eager_registration_rejects_forward_reference() {
    let home = TestHome::new();
    let mut mgr = home.manager();
    let err = mgr
        .add_module(EnvModule::new("x").depends_on("y"))
        .unwrap_err();
    assert_eq!(
        err,
        ModuleError::MissingDependency {
            module: "x".to_string(),
            dependency: "y".to_string()
        }
    );
    assert!(matches!(
        mgr.add_module(EnvModule::new("y").depends_on("x")),
        Err(ModuleError::MissingDependency { .. })
    ));
    assert_eq!(mgr.modules().count(), 0);
}

#[test]
fn modules_file_registers_forward_references() {
    let home = TestHome::new();
    home.write(
        "modules.toml",
        r#"[[modules]]
name = "golang"
priority = 20
dependencies = ["base"]
paths = ["/usr/local/go/bin"]
environment = [{ name = "GOPATH", value = "$HOME/go" }]

[[modules]]
name = "base"
priority = 10
environment = [{ name = "EDITOR", value = "vim" }]
"#,
    );
    let modules = modules_file::load(&home.path().join("modules.toml")).unwrap();
    let mut mgr = home.manager();
    run_installers(&[&StaticModules::new("modules.toml", modules)], &mut mgr).unwrap();

    assert_eq!(mgr.plan().unwrap().order, ["base", "golang"]);
    mgr.apply_configuration().unwrap();
    let content = home.read(".eee-env");
    let editor = content.find("export EDITOR").unwrap();
    let gopath = content.find("export GOPATH").unwrap();
    assert!(editor < gopath);
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[test]
fn changed_content_is_backed_up_and_rotated() {
    let home = TestHomeBuilder::new().max_backups(2).build();
    for value in ["1", "2", "3", "4"] {
        let mut mgr = home.manager();
        mgr.add_module(EnvModule::new("base").env("A", value)).unwrap();
        mgr.apply_configuration().unwrap();
    }

    let backups: Vec<String> = home
        .entries()
        .into_iter()
        .filter(|n| n.starts_with(".eee-env.backup."))
        .collect();
    assert_eq!(backups.len(), 2);
    assert!(home.read(".eee-env").contains("export A=\"4\""));
    assert!(home.read(&backups[1]).contains("export A=\"3\""));
}

#[test]
fn custom_config_file_location() {
    let home = TestHomeBuilder::new()
        .config_file("~/.config/eee/env.sh")
        .zsh(false)
        .build();
    let report = home.manager().apply_configuration().unwrap();

    let expected = home.path().join(".config/eee/env.sh");
    assert_eq!(report.config_path, expected);
    assert!(expected.exists());
    assert!(!home.path().join(".zshrc").exists());
    assert!(home.read(".bashrc").contains(&expected.display().to_string()));
}

#[test]
fn fish_is_skipped_with_warning() {
    let home = TestHomeBuilder::new().fish(true).build();
    let report = home.manager().apply_configuration().unwrap();

    assert!(matches!(
        report.shells.last(),
        Some((_, ResourceChange::Skipped { .. }))
    ));
    assert_eq!(home.steps_with(TaskStatus::Skipped), ["shell: fish"]);
}

#[test]
fn dry_run_leaves_home_untouched() {
    let home = TestHomeBuilder::new().dry_run().build();
    home.write(".bashrc", "# mine\n");
    let mut mgr = home.manager();
    mgr.add_module(EnvModule::new("base").env("A", "1")).unwrap();

    let report = mgr.apply_configuration().unwrap();
    assert!(report.dry_run);
    assert_eq!(home.entries(), [".bashrc"]);
    assert_eq!(home.read(".bashrc"), "# mine\n");
    assert_eq!(
        home.steps_with(TaskStatus::DryRun),
        ["persist", "shell: bash", "shell: zsh"]
    );
}
