//! Logging setup.
//!
//! Pipe output is read in the Bitbucket Pipelines log viewer, so lines are
//! compact, go to stderr, and only carry ANSI colors on a terminal.

use std::io::{self, IsTerminal};

use tracing_subscriber::EnvFilter;

/// Crate target, used to keep dependency logs at `warn`.
const TARGET: &str = "review_pipe";

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(debug: bool) -> EnvFilter {
    let level = if debug { "debug" } else { "info" };
    EnvFilter::new(format!("warn,{TARGET}={level}"))
}

/// Install the global subscriber. `RUST_LOG` takes precedence over `debug`.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init(debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(debug));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .compact()
        .try_init();
}
