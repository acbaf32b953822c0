//! Structured logging setup.
//!
//! Services emit `tracing` events with key-value fields (thread, scope,
//! workflow, request identifiers). [`init`] installs a global
//! `tracing-subscriber` formatter filtered by `PARLEY_LOG`, falling back to
//! `RUST_LOG` and then to `info`.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Environment variable consulted first for the log filter.
pub const LOG_ENV_VAR: &str = "PARLEY_LOG";

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, single-line output.
    #[default]
    Pretty,
    /// Newline-delimited JSON objects.
    Json,
}

/// Errors raised while installing the log subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global subscriber has already been installed.
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInitialised(String),
}

/// Builds the log filter from the environment.
#[must_use]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global `tracing` subscriber.
///
/// Safe to call more than once: later calls leave the first subscriber in
/// place and report [`TelemetryError::AlreadyInitialised`].
///
/// # Errors
///
/// Returns [`TelemetryError::AlreadyInitialised`] when a global subscriber
/// is already set.
pub fn init(format: LogFormat) -> Result<(), TelemetryError> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true);

    let result = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    result.map_err(|err| TelemetryError::AlreadyInitialised(err.to_string()))
}
