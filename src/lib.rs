//! Idempotent shell-environment configuration engine.
//!
//! Installer packages contribute named modules (environment variables, PATH
//! entries, aliases, functions, raw shell code).  The engine orders them by
//! dependency and priority, merges them into one configuration, renders a
//! single sourceable script, writes it only when it changed, and makes the
//! user's shells source it.
//!
//! The public API is organised into layers:
//!
//! - **[`modules`]**: module data, registry, resolver, merger, renderer (pure)
//! - **[`resources`]**: idempotent `check + apply` primitives for files on disk
//! - **[`engine`]**: the per-run [`EnvManager`](engine::EnvManager) handle
//! - **[`installer`]**: the package hook interface driving the manager
//! - **[`commands`]**: top-level subcommand orchestration (`apply`, `validate`, `inspect`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod exec;
pub mod installer;
pub mod logging;
pub mod modules;
pub mod resources;
