//! Logging setup.
//!
//! Structured logging to stderr via `tracing`. Verbosity defaults to
//! `info` for this crate, raised to `debug` with the CLI's verbose flag;
//! `RUST_LOG` overrides both.

use std::io;

use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// # Arguments
///
/// * `verbose` - raise this crate's default level from `info` to `debug`
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "tilefix=debug"
    } else {
        "tilefix=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
