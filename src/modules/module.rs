//! Declarative environment fragments and their validation rules.
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ModuleError;

/// Priority assigned to modules that do not declare one.
pub const DEFAULT_PRIORITY: i32 = 100;

#[allow(clippy::unwrap_used)]
static MODULE_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

#[allow(clippy::unwrap_used)]
static ENV_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z_][A-Z0-9_]*$").unwrap());

#[allow(clippy::unwrap_used)]
static SHELL_IDENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").unwrap());

/// An exported environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    /// Variable name (e.g. `"GOPATH"`).
    pub name: String,
    /// Value, written inside double quotes so `$VAR` references expand.
    pub value: String,
}

/// A shell alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    /// Alias name (e.g. `"ll"`).
    pub name: String,
    /// Command the alias expands to.
    pub command: String,
}

/// A shell function definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellFunction {
    /// Function name.
    pub name: String,
    /// Function body, possibly multi-line; re-indented on render.
    pub body: String,
}

/// Configuration payload carried by a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Variables to export.
    pub environment: Vec<EnvVar>,
    /// Directories to put on `PATH`.
    pub paths: Vec<String>,
    /// Aliases to define.
    pub aliases: Vec<Alias>,
    /// Functions to define.
    pub functions: Vec<ShellFunction>,
    /// Raw shell lines emitted verbatim.
    pub custom_code: Vec<String>,
    /// Lower runs earlier among modules whose dependencies are met.
    pub priority: i32,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            environment: Vec::new(),
            paths: Vec::new(),
            aliases: Vec::new(),
            functions: Vec::new(),
            custom_code: Vec::new(),
            priority: DEFAULT_PRIORITY,
        }
    }
}

/// A named, declarative fragment of shell configuration.
///
/// Modules are built with the fluent setters and handed to
/// [`ModuleRegistry::add`](super::ModuleRegistry::add):
///
/// ```
/// use eee_env::modules::EnvModule;
///
/// let go = EnvModule::new("golang")
///     .description("Go toolchain")
///     .priority(20)
///     .env("GOPATH", "$HOME/go")
///     .path("/usr/local/go/bin")
///     .path("$HOME/go/bin");
///
/// assert!(go.validate().is_ok());
/// assert_eq!(go.config.paths.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvModule {
    /// Unique module name.
    pub name: String,
    /// Shown by `inspect`.
    #[serde(default)]
    pub description: String,
    /// What the module contributes.
    #[serde(flatten)]
    pub config: ModuleConfig,
    /// Modules that must come before this one.
    #[serde(default)]
    pub dependencies: BTreeSet<String>,
    /// Free-form version metadata; not interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Stored for callers but never evaluated by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl EnvModule {
    /// Create an empty module with the default priority.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            config: ModuleConfig::default(),
            dependencies: BTreeSet::new(),
            version: None,
            condition: None,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the ordering priority.
    #[must_use]
    pub const fn priority(mut self, priority: i32) -> Self {
        self.config.priority = priority;
        self
    }

    /// Set an environment variable, replacing an earlier value for the same name.
    #[must_use]
    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.config.environment.iter_mut().find(|v| v.name == name) {
            Some(existing) => existing.value = value,
            None => self.config.environment.push(EnvVar { name, value }),
        }
        self
    }

    /// Append a `PATH` entry.
    #[must_use]
    pub fn path(mut self, dir: impl Into<String>) -> Self {
        self.config.paths.push(dir.into());
        self
    }

    /// Add an alias.
    #[must_use]
    pub fn alias(mut self, name: impl Into<String>, command: impl Into<String>) -> Self {
        self.config.aliases.push(Alias {
            name: name.into(),
            command: command.into(),
        });
        self
    }

    /// Add a shell function.
    #[must_use]
    pub fn function(mut self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.config.functions.push(ShellFunction {
            name: name.into(),
            body: body.into(),
        });
        self
    }

    /// Append a raw shell line.
    #[must_use]
    pub fn code(mut self, line: impl Into<String>) -> Self {
        self.config.custom_code.push(line.into());
        self
    }

    /// Require `dependency` to be ordered before this module.
    #[must_use]
    pub fn depends_on(mut self, dependency: impl Into<String>) -> Self {
        self.dependencies.insert(dependency.into());
        self
    }

    /// Attach version metadata.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Attach a condition string.
    #[must_use]
    pub fn condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Check the module's name, keys, and values.
    ///
    /// Dependency existence is the registry's concern and is not checked here.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::Validation`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ModuleError> {
        let fail = |message: String| ModuleError::Validation {
            module: self.name.clone(),
            message,
        };

        if !MODULE_NAME.is_match(&self.name) {
            return Err(fail("name must match [A-Za-z0-9_-]+".to_string()));
        }

        let mut seen = HashSet::new();
        for var in &self.config.environment {
            if !ENV_NAME.is_match(&var.name) {
                return Err(fail(format!(
                    "environment variable '{}' must match [A-Z_][A-Z0-9_]*",
                    var.name
                )));
            }
            if !seen.insert(var.name.as_str()) {
                return Err(fail(format!(
                    "environment variable '{}' is declared twice",
                    var.name
                )));
            }
        }

        for dir in &self.config.paths {
            if dir.trim().is_empty() {
                return Err(fail("path entries must not be empty".to_string()));
            }
            if dir.contains('\n') || dir.contains('"') {
                return Err(fail(format!(
                    "path '{}' must not contain newlines or double quotes",
                    dir.escape_debug()
                )));
            }
        }

        let mut seen = HashSet::new();
        for alias in &self.config.aliases {
            if !SHELL_IDENT.is_match(&alias.name) {
                return Err(fail(format!(
                    "alias '{}' must match [A-Za-z_][A-Za-z0-9_-]*",
                    alias.name
                )));
            }
            if !seen.insert(alias.name.as_str()) {
                return Err(fail(format!("alias '{}' is declared twice", alias.name)));
            }
        }

        let mut seen = HashSet::new();
        for function in &self.config.functions {
            if !SHELL_IDENT.is_match(&function.name) {
                return Err(fail(format!(
                    "function '{}' must match [A-Za-z_][A-Za-z0-9_-]*",
                    function.name
                )));
            }
            if !seen.insert(function.name.as_str()) {
                return Err(fail(format!(
                    "function '{}' is declared twice",
                    function.name
                )));
            }
        }

        if let Some(dep) = self.dependencies.iter().find(|d| !MODULE_NAME.is_match(d)) {
            return Err(fail(format!(
                "dependency '{dep}' is not a valid module name"
            )));
        }

        Ok(())
    }
}
