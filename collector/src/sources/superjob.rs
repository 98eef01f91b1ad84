//! SuperJob vacancy search.

use common::{Salary, VacancyRecord};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{info, warn};

use super::{http_client, trim_base_url, ApiKey, FetchError, SearchQuery, VacancySource};

pub const DEFAULT_BASE_URL: &str = "https://api.superjob.ru";

const PROVIDER: &str = "SuperJob";

/// Header carrying the application key.
const APP_ID_HEADER: &str = "X-Api-App-Id";

const PAGE_SIZE: u32 = 100;

/// Client for the SuperJob API.
///
/// The key is sent as-is; an empty key is not rejected here, SuperJob will
/// answer with a failure status instead.
#[derive(Debug)]
pub struct SuperJobSource {
    client: Client,
    base_url: String,
    api_key: ApiKey,
}

#[derive(Debug, Deserialize)]
struct VacanciesResponse {
    objects: Vec<SjVacancy>,
}

#[derive(Debug, Deserialize)]
struct SjVacancy {
    profession: String,
    link: String,
    payment_from: Option<u64>,
    education: Option<Titled>,
    experience: Option<Titled>,
    place_of_work: Option<Titled>,
    type_of_work: Option<Titled>,
}

/// Catalogue entries (education, experience, ...) only matter for their title.
#[derive(Debug, Deserialize)]
struct Titled {
    title: Option<String>,
}

fn title_of(entry: Option<Titled>) -> String {
    entry.and_then(|entry| entry.title).unwrap_or_default()
}

impl SuperJobSource {
    pub fn new(base_url: &str, api_key: ApiKey) -> Result<Self, FetchError> {
        Ok(Self {
            client: http_client()?,
            base_url: trim_base_url(base_url),
            api_key,
        })
    }

    fn try_fetch(&self, query: &SearchQuery) -> Result<Vec<VacancyRecord>, FetchError> {
        let count = PAGE_SIZE.to_string();

        let response = self
            .client
            .get(format!("{}/2.33/vacancies", self.base_url))
            .header(APP_ID_HEADER, self.api_key.expose())
            .query(&[("keyword", query.text.as_str()), ("count", count.as_str())])
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

        Ok(body.objects.into_iter().map(to_record).collect())
    }
}

/// Converts one SuperJob object into the common record shape.
fn to_record(item: SjVacancy) -> VacancyRecord {
    // SuperJob reports an unknown salary as 0
    let salary = Salary::from_optional(item.payment_from);

    let description = format!(
        "Education: {}. Experience: {}. Workplace: {}. Work mode: {}.",
        title_of(item.education),
        title_of(item.experience),
        title_of(item.place_of_work),
        title_of(item.type_of_work),
    );

    VacancyRecord::new(item.profession, item.link, salary, description)
}

impl VacancySource for SuperJobSource {
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
                warn!(error = %e, "failed to get vacancies from SuperJob");
                Vec::new()
            }
        }
    }
}
