//! Log output for the command-line tools
//!
//! Logs go to stderr so stdout carries only result lines. `RUST_LOG`
//! overrides the default `info` filter.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber; later calls are ignored
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
