//! Tracing setup for the homecare binary.
//!
//! Log lines go to stderr so that command output on stdout (including
//! `list --json`) stays machine readable.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Env var consulted before `RUST_LOG`
pub const LOG_ENV: &str = "HOMECARE_LOG";

/// Default filter for a `-v` count
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber
///
/// `HOMECARE_LOG` wins over `RUST_LOG`; when neither is set the level comes
/// from the number of `-v` flags. Calling this twice is a no-op.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(verbosity > 1)
                .with_writer(std::io::stderr),
        )
        .try_init();

    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
