//! Shared vacancy types
//!
//! The record every source produces and every store persists, plus the
//! line-delimited JSON store used by the collector.

mod record;
mod store;

pub use record::{DESCRIPTION_NOT_PROVIDED, SALARY_NOT_SPECIFIED, Salary, VacancyRecord};
pub use store::{JsonLinesStore, StoreError, VacancyStore};
