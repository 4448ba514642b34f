// src/observability/mod.rs
//! Logging setup for binaries and tests
//!
//! The library only emits `tracing` events and `metrics` counters; installing
//! a subscriber or an exporter is left to the embedding application.

use crate::utils::errors::{Result, WatchError};
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FORMAT_ENV: &str = "ISSUE_REPORTER_LOG_FORMAT";

/// Install the global tracing subscriber.
///
/// Filtering follows `RUST_LOG` (default `info`); set
/// `ISSUE_REPORTER_LOG_FORMAT=json` for JSON lines.
pub fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = fmt().with_env_filter(filter).with_target(false);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| WatchError::Config(format!("Failed to install tracing subscriber: {}", e)))
}
