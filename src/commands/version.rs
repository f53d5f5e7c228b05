//! Command: print version information.

/// Version embedded by `build.rs`, or the crate version.
#[must_use]
pub const fn current() -> &'static str {
    match option_env!("EEE_ENV_VERSION") {
        Some(version) => version,
        None => env!("CARGO_PKG_VERSION"),
    }
}

/// Print the version to stdout.
#[allow(clippy::print_stdout)]
pub fn run() {
    println!("eee-env {}", current());
}
