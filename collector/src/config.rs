use std::env;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

use crate::sources::{headhunter, superjob, ApiKey};

/// Environment variable holding the SuperJob application key.
pub const SUPERJOB_KEY_VAR: &str = "API_KEY_SUPER_JOB";

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub superjob_api_key: ApiKey,
    pub store_path: PathBuf,
    pub headhunter_url: String,
    pub superjob_url: String,
    pub telemetry: TelemetryConfig,
}

/// Log filter used when `RUST_LOG` is not set.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be an absolute URL: {source}")]
    InvalidUrl {
        var: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("VACANCY_STORE_PATH must not be empty")]
    EmptyStorePath,
}

impl AppConfig {
    /// Loads `.env` (if any) and then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // A missing key is sent as empty and rejected by SuperJob itself
        let superjob_api_key = ApiKey::new(lookup(SUPERJOB_KEY_VAR).unwrap_or_default());

        let store_path =
            lookup("VACANCY_STORE_PATH").unwrap_or_else(|| "vacancies.json".to_string());
        if store_path.trim().is_empty() {
            return Err(ConfigError::EmptyStorePath);
        }

        let headhunter_url = base_url(&lookup, "HH_API_URL", headhunter::DEFAULT_BASE_URL)?;
        let superjob_url = base_url(&lookup, "SUPERJOB_API_URL", superjob::DEFAULT_BASE_URL)?;

        let log_level = lookup("COLLECTOR_LOG_LEVEL").unwrap_or_else(|| "warn".to_string());

        Ok(Self {
            superjob_api_key,
            store_path: PathBuf::from(store_path),
            headhunter_url,
            superjob_url,
            telemetry: TelemetryConfig { log_level },
        })
    }
}

fn base_url<F>(lookup: &F, var: &'static str, default: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(var).unwrap_or_else(|| default.to_string());
    Url::parse(&value).map_err(|source| ConfigError::InvalidUrl { var, source })?;
    Ok(value)
}
