//! Vacancy collector
//!
//! Queries HeadHunter and SuperJob, normalizes their listings into
//! `common::VacancyRecord`, saves them through a `VacancyStore` and lets the
//! user narrow the saved results.

pub mod config;
pub mod session;
pub mod sources;
pub mod telemetry;

pub use config::{AppConfig, ConfigError};
pub use session::{FinalFilter, RunSummary, Session, SessionError, SessionOptions};
pub use sources::{
    AreaResolver, ApiKey, FetchError, HeadHunterSource, SearchQuery, SuperJobSource, VacancySource,
};
