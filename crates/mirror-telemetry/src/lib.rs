//! # Mirror Telemetry
//!
//! Structured logging setup for the Mirror Dissonance Oracle. Monitoring
//! dashboards, distributed tracing backends, and metrics export are
//! explicitly out of scope for this project (spec §1 Non-goals); what
//! remains in scope for any real deployment is the ambient concern of
//! *structured, filterable logs*, which this crate provides on top of
//! `tracing` + `tracing-subscriber`, the same foundation the wider
//! reference architecture builds its full LGTM stack on.
//!
//! ## Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MIRROR_LOG_LEVEL` | `info` | `tracing_subscriber::EnvFilter` directive |
//! | `MIRROR_LOG_JSON` | `false` | Emit JSON-formatted log lines instead of text |

mod config;

pub use config::LoggingConfig;

use thiserror::Error;
use tracing_subscriber::{fmt, EnvFilter};

/// Errors initializing the logging subsystem.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to install global tracing subscriber: {0}")]
    SubscriberInstall(String),
}

/// Installs a process-global `tracing` subscriber per `config`.
///
/// Safe to call at most once per process; a second call returns an error
/// rather than panicking, since test binaries may each try to initialize
/// logging independently.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let result = if config.json_logs {
        fmt().with_env_filter(filter).json().try_init()
    } else {
        fmt().with_env_filter(filter).try_init()
    };

    result.map_err(|e| TelemetryError::SubscriberInstall(e.to_string()))
}
