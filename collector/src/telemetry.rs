//! Log output for the collector binary.
//!
//! Diagnostics go to stderr; stdout belongs to the prompts and results.

use crate::config::TelemetryConfig;
use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Variable that overrides the configured level, e.g. `RUST_LOG=collector=debug`.
const OVERRIDE_VAR: &str = "RUST_LOG";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("log level {directives:?} is not a valid tracing filter")]
    BadLevel {
        directives: String,
        #[source]
        source: ParseError,
    },

    #[error("a global logger is already installed: {0}")]
    AlreadyInstalled(Box<dyn std::error::Error + Send + Sync>),
}

/// Picks the filter: `RUST_LOG` when it parses, the configured level otherwise.
fn log_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_env(OVERRIDE_VAR) {
        return Ok(filter);
    }

    EnvFilter::try_new(&config.log_level).map_err(|source| TelemetryError::BadLevel {
        directives: config.log_level.clone(),
        source,
    })
}

/// Installs the process-wide subscriber. Call once from `main`.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = log_filter(config)?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .without_time()
        .with_level(true)
        .try_init()
        .map_err(TelemetryError::AlreadyInstalled)
}
