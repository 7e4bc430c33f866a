//! Diagnostic logging via `tracing`, written to stderr.
//!
//! Verbosity comes from the `-v` count unless `DOCMIRROR_LOG` holds an
//! `EnvFilter` directive, which then wins.

use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the `-v` derived filter.
pub const LOG_ENV: &str = "DOCMIRROR_LOG";

/// Map a `-v` count to a filter directive. Saturates at `trace`.
#[must_use]
pub const fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Later calls are ignored.
pub fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(verbosity_to_directive(verbosity)));

    let use_ansi = std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(use_ansi)
        .with_target(verbosity >= 2)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}
