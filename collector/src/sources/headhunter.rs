//! HeadHunter (hh.ru) vacancy search and area lookup.

use common::{Salary, VacancyRecord};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{info, warn};

use super::{http_client, trim_base_url, AreaResolver, FetchError, SearchQuery, VacancySource};

pub const DEFAULT_BASE_URL: &str = "https://api.hh.ru";

const PROVIDER: &str = "HeadHunter";

/// Client for the public HeadHunter API. No credential is needed.
#[derive(Debug)]
pub struct HeadHunterSource {
    client: Client,
    base_url: String,
    page: u32,
    per_page: u32,
    only_with_salary: bool,
}

/// Response from `GET /vacancies`.
#[derive(Debug, Deserialize)]
struct VacanciesResponse {
    items: Vec<HhVacancy>,
}

#[derive(Debug, Deserialize)]
struct HhVacancy {
    name: String,
    alternate_url: String,
    salary: Option<HhSalary>,
    snippet: Option<HhSnippet>,
}

#[derive(Debug, Deserialize)]
struct HhSalary {
    from: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct HhSnippet {
    requirement: Option<String>,
}

/// One country entry from `GET /areas`.
#[derive(Debug, Deserialize)]
struct HhCountry {
    #[serde(default)]
    areas: Vec<HhArea>,
}

#[derive(Debug, Deserialize)]
struct HhArea {
    id: String,
    name: String,
}

impl HeadHunterSource {
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        Ok(Self {
            client: http_client()?,
            base_url: trim_base_url(base_url),
            page: 0,
            per_page: 100,
            only_with_salary: true,
        })
    }

    /// Selects which page of results to request.
    pub fn with_page(mut self, page: u32, per_page: u32) -> Self {
        self.page = page;
        self.per_page = per_page;
        self
    }

    pub fn with_only_salary(mut self, only_with_salary: bool) -> Self {
        self.only_with_salary = only_with_salary;
        self
    }

    fn search_params(&self, query: &SearchQuery) -> Vec<(&'static str, String)> {
        // Match against the vacancy name only
        let mut params = vec![
            ("text", format!("NAME:{}", query.text)),
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
            ("only_with_salary", self.only_with_salary.to_string()),
        ];

        if let Some(area) = &query.area_id {
            params.push(("area", area.clone()));
        }
        if let Some(min) = query.salary_min {
            params.push(("salary_from", min.to_string()));
        }
        if let Some(max) = query.salary_max {
            params.push(("salary_to", max.to_string()));
        }

        params
    }

    fn try_fetch(&self, query: &SearchQuery) -> Result<Vec<VacancyRecord>, FetchError> {
        let response = self
            .client
            .get(format!("{}/vacancies", self.base_url))
            .query(&self.search_params(query))
            .send()
            .map_err(|source| FetchError::Transport {
                provider: PROVIDER,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                provider: PROVIDER,
                status,
            });
        }

        let body: VacanciesResponse = response.json().map_err(|source| FetchError::Body {
            provider: PROVIDER,
            source,
        })?;

        Ok(body.items.into_iter().map(to_record).collect())
    }

    fn try_resolve_area_id(&self, name: &str) -> Result<Option<String>, FetchError> {
        let response = self
            .client
            .get(format!("{}/areas", self.base_url))
            .send()
            .map_err(|source| FetchError::Transport {
                provider: PROVIDER,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                provider: PROVIDER,
                status,
            });
        }

        let countries: Vec<HhCountry> = response.json().map_err(|source| FetchError::Body {
            provider: PROVIDER,
            source,
        })?;

        Ok(find_area_id(countries, name))
    }
}

/// Converts one HeadHunter item into the common record shape.
fn to_record(item: HhVacancy) -> VacancyRecord {
    let salary = item
        .salary
        .and_then(|salary| salary.from)
        .map_or(Salary::NotSpecified, Salary::Amount);

    let description = item
        .snippet
        .and_then(|snippet| snippet.requirement)
        .unwrap_or_default();

    VacancyRecord::new(item.name, item.alternate_url, salary, description)
}

/// First exact name match one level below the countries.
fn find_area_id(countries: Vec<HhCountry>, name: &str) -> Option<String> {
    countries
        .into_iter()
        .flat_map(|country| country.areas)
        .find(|area| area.name == name)
        .map(|area| area.id)
}

impl VacancySource for HeadHunterSource {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn fetch(&self, query: &SearchQuery) -> Vec<VacancyRecord> {
        match self.try_fetch(query) {
            Ok(records) => {
                info!(provider = PROVIDER, count = records.len(), "fetched vacancies");
                records
            }
            Err(e) => {
                warn!(error = %e, "failed to get vacancies from HeadHunter");
                Vec::new()
            }
        }
    }
}

impl AreaResolver for HeadHunterSource {
    fn resolve_area_id(&self, name: &str) -> Option<String> {
        if name.trim().is_empty() {
            return None;
        }

        match self.try_resolve_area_id(name) {
            Ok(Some(id)) => {
                info!(area = name, id = %id, "resolved area");
                Some(id)
            }
            Ok(None) => {
                info!(area = name, "no area with this name, searching everywhere");
                None
            }
            Err(e) => {
                warn!(error = %e, "failed to look up HeadHunter areas");
                None
            }
        }
    }
}
