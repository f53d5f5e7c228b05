//! Render a [`UnifiedConfig`] as a sourceable shell script.
use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use super::UnifiedConfig;

/// First comment line of the generated file.
pub const HEADER: &str = "# EEE Development Environment Configuration";

/// Prefix of the generation-timestamp line.  Ignored by [`same_content`].
pub const TIMESTAMP_PREFIX: &str = "# Generated at: ";

/// Zero-based line index of the timestamp in the header.
const TIMESTAMP_LINE: usize = 2;

/// Last line of the generated file.
pub const FOOTER: &str = "# End of EEE Development Environment Configuration";

/// Render `config` with the given generation time.
///
/// Sections appear in a fixed order and are omitted when empty: exports,
/// PATH guards, aliases, functions, custom code.
#[must_use]
pub fn render(config: &UnifiedConfig, generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();
    out.push_str("#!/bin/bash\n");
    out.push_str(HEADER);
    out.push('\n');
    let _ = writeln!(
        out,
        "{TIMESTAMP_PREFIX}{}",
        generated_at.format("%Y-%m-%dT%H:%M:%SZ")
    );
    out.push_str("# Managed by eee-env. Manual edits will be overwritten.\n");

    if !config.environment.is_empty() {
        out.push_str("\n# Environment variables\n");
        for var in &config.environment {
            let _ = writeln!(out, "export {}=\"{}\"", var.name, double_quote(&var.value));
        }
    }

    if !config.paths.is_empty() {
        out.push_str("\n# PATH entries\n");
        for dir in &config.paths {
            let dir = double_quote(dir);
            let _ = writeln!(out, "case \":${{PATH}}:\" in");
            let _ = writeln!(out, "  *\":{dir}:\"*) ;;");
            let _ = writeln!(out, "  *) export PATH=\"{dir}:${{PATH}}\" ;;");
            out.push_str("esac\n");
        }
    }

    if !config.aliases.is_empty() {
        out.push_str("\n# Aliases\n");
        for alias in &config.aliases {
            let _ = writeln!(out, "alias {}={}", alias.name, single_quote(&alias.command));
        }
    }

    if !config.functions.is_empty() {
        out.push_str("\n# Functions\n");
        for function in &config.functions {
            let _ = writeln!(out, "{}() {{", function.name);
            for line in reindent(&function.body) {
                out.push_str(&line);
                out.push('\n');
            }
            out.push_str("}\n");
        }
    }

    if !config.custom_code.is_empty() {
        out.push_str("\n# Custom code\n");
        for line in &config.custom_code {
            out.push_str(line);
            out.push('\n');
        }
    }

    out.push('\n');
    out.push_str(FOOTER);
    out.push('\n');
    out
}

/// Lines of a rendered file minus the header's generation timestamp.
///
/// Only the timestamp slot of the header is skipped; a custom-code line that
/// happens to look like a timestamp still counts.
pub fn significant_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .enumerate()
        .filter(|(i, l)| !(*i == TIMESTAMP_LINE && l.starts_with(TIMESTAMP_PREFIX)))
        .map(|(_, l)| l)
}

/// Compare two rendered files, ignoring the generation-timestamp line.
#[must_use]
pub fn same_content(a: &str, b: &str) -> bool {
    a.ends_with('\n') == b.ends_with('\n') && significant_lines(a).eq(significant_lines(b))
}

/// Escape for use inside a double-quoted string, leaving `$` expansions intact.
fn double_quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn single_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Strip the common leading indentation of `body` and indent every
/// non-blank line by two spaces.
fn reindent(body: &str) -> Vec<String> {
    let lines: Vec<&str> = body.trim_matches('\n').lines().collect();
    let common = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| {
            if l.trim().is_empty() {
                String::new()
            } else {
                format!("  {}", l.get(common..).unwrap_or(l).trim_end())
            }
        })
        .collect()
}
