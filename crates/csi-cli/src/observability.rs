//! Tracing initialization: a `RUST_LOG`-driven `EnvFilter`, without the
//! hot-reload machinery a long-running server needs (a one-shot CLI
//! invocation never needs to change its own log level mid-run).

use tracing_subscriber::{fmt, EnvFilter};

/// Initializes a global `tracing` subscriber.
///
/// Honors `RUST_LOG` when set; otherwise falls back to `default_level`.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(fmt::format().compact())
        .try_init();
}
