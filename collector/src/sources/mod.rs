//! Remote vacancy providers.
//!
//! Every provider follows the same failure policy: a failed request is
//! logged and yields an empty list, so callers never deal with network
//! errors directly.

use common::VacancyRecord;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

pub mod headhunter;
pub mod superjob;

pub use headhunter::HeadHunterSource;
pub use superjob::SuperJobSource;

/// Search text plus the optional refinements a provider may honor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub area_id: Option<String>,
    pub salary_min: Option<u64>,
    pub salary_max: Option<u64>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Why a provider request produced no vacancies.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{provider} responded with status {status}")]
    Status {
        provider: &'static str,
        status: StatusCode,
    },

    #[error("request to {provider} failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response body from {provider}: {source}")]
    Body {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// A provider that turns a search query into normalized vacancies.
pub trait VacancySource {
    /// Human-readable provider name used in logs and section headers.
    fn name(&self) -> &'static str;

    /// Fetches one page of vacancies. Failures are logged and give an empty list.
    fn fetch(&self, query: &SearchQuery) -> Vec<VacancyRecord>;
}

/// Maps a region name to the provider's area id.
pub trait AreaResolver {
    fn resolve_area_id(&self, name: &str) -> Option<String>;
}

/// Credential sent to SuperJob. Never printed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

pub(crate) fn http_client() -> Result<Client, FetchError> {
    Client::builder()
        .user_agent(concat!("vacancy-collector/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(FetchError::Client)
}

pub(crate) fn trim_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}
