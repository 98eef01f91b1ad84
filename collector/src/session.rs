//! Interactive search session
//!
//! Asks for a query and filters, fetches from every source, saves the
//! results and finally narrows the saved vacancies by a user criterion.

use clap::ValueEnum;
use common::{StoreError, VacancyRecord, VacancyStore};
use regex::Regex;
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::{debug, info};

use crate::sources::{AreaResolver, SearchQuery, VacancySource};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("console error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("input closed before a search query was entered")]
    InputClosed,
}

/// How saved vacancies are narrowed before the final listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FinalFilter {
    /// Substring match in the store, then keep titles equal to the
    /// criterion ignoring case.
    #[default]
    ExactTitle,
    /// Show every title containing the criterion.
    Substring,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Empty the store before saving this run's results.
    pub clear_before_run: bool,
    pub final_filter: FinalFilter,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            clear_before_run: true,
            final_filter: FinalFilter::ExactTitle,
        }
    }
}

/// Counts reported back to `main` for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched: Vec<(&'static str, usize)>,
    pub displayed_matches: usize,
}

pub struct Session<'a, S> {
    sources: Vec<&'a dyn VacancySource>,
    areas: &'a dyn AreaResolver,
    store: S,
    options: SessionOptions,
}

impl<'a, S: VacancyStore> Session<'a, S> {
    pub fn new(
        sources: Vec<&'a dyn VacancySource>,
        areas: &'a dyn AreaResolver,
        store: S,
        options: SessionOptions,
    ) -> Self {
        Self {
            sources,
            areas,
            store,
            options,
        }
    }

    /// Runs one full search over the given console streams.
    pub fn run<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        output: &mut W,
    ) -> Result<RunSummary, SessionError> {
        // Collect the query and optional filters
        let text = loop {
            let text = prompt(input, output, "Enter search query: ")?;
            if !text.is_empty() {
                break text;
            }
        };
        let region = prompt(input, output, "Region (leave blank for any): ")?;
        let salary_min = parse_salary_bound(&prompt(
            input,
            output,
            "Minimum salary (leave blank if not required): ",
        )?);
        let salary_max = parse_salary_bound(&prompt(
            input,
            output,
            "Maximum salary (leave blank if not required): ",
        )?);

        // An unknown region only drops the area filter
        let area_id = if region.is_empty() {
            None
        } else {
            self.areas.resolve_area_id(&region)
        };

        let query = SearchQuery {
            text,
            area_id,
            salary_min,
            salary_max,
        };
        debug!(?query, "searching");

        let results: Vec<(&'static str, Vec<VacancyRecord>)> = self
            .sources
            .iter()
            .map(|source| (source.name(), source.fetch(&query)))
            .collect();

        if self.options.clear_before_run {
            self.store.clear()?;
        }

        let mut fetched = Vec::with_capacity(results.len());
        for (name, records) in &results {
            writeln!(output, "\nResults from {}:", name)?;
            for record in records {
                self.store.append(record)?;
                writeln!(output, "{}\n", record)?;
            }
            if records.is_empty() {
                writeln!(output, "No vacancies found.\n")?;
            }
            fetched.push((*name, records.len()));
        }

        // Surrounding spaces are part of the criterion
        let criterion =
            prompt_line(input, output, "Enter a criterion to search saved vacancies: ")?;
        let saved = self.store.query(&criterion)?;
        let matches = narrow(saved, &criterion, self.options.final_filter);

        writeln!(output, "\nSaved vacancies matching '{}':", criterion)?;
        for record in &matches {
            writeln!(output, "{}\n", record)?;
        }
        if matches.is_empty() {
            writeln!(output, "No vacancies found.")?;
        }
        output.flush()?;

        info!(criterion = %criterion, matches = matches.len(), "search session finished");

        Ok(RunSummary {
            fetched,
            displayed_matches: matches.len(),
        })
    }
}

fn narrow(saved: Vec<VacancyRecord>, criterion: &str, filter: FinalFilter) -> Vec<VacancyRecord> {
    match filter {
        FinalFilter::Substring => saved,
        FinalFilter::ExactTitle => {
            let wanted = criterion.to_lowercase();
            saved
                .into_iter()
                .filter(|record| record.title.to_lowercase() == wanted)
                .collect()
        }
    }
}

/// Prints `label` and reads one trimmed line.
fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
) -> Result<String, SessionError> {
    Ok(prompt_line(input, output, label)?.trim().to_string())
}

/// Prints `label` and reads one line, dropping only the line ending.
fn prompt_line<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
) -> Result<String, SessionError> {
    write!(output, "{}", label)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(SessionError::InputClosed);
    }

    let content_len = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(content_len);
    Ok(line)
}

/// Reads a salary bound typed by the user, e.g. "120 000" or "120,000 rub".
/// Blank or digit-free input means no bound. Only the first number counts and
/// anything after a decimal point is dropped.
pub fn parse_salary_bound(input: &str) -> Option<u64> {
    // Whole three-digit groups only, so "50000.00" or "100000 200000" stay apart
    let re = Regex::new(r"\d{1,3}(?:[ ,']\d{3})+|\d+").ok()?;
    let matched = re.find(input)?;

    let clean_number: String = matched
        .as_str()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    clean_number.parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{JsonLinesStore, Salary};
    use std::cell::RefCell;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    struct FakeSource {
        name: &'static str,
        records: Vec<VacancyRecord>,
        seen: RefCell<Vec<SearchQuery>>,
    }

    impl FakeSource {
        fn new(name: &'static str, records: Vec<VacancyRecord>) -> Self {
            Self {
                name,
                records,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl VacancySource for FakeSource {
        fn name(&self) -> &'static str {
            self.name
        }

        fn fetch(&self, query: &SearchQuery) -> Vec<VacancyRecord> {
            self.seen.borrow_mut().push(query.clone());
            self.records.clone()
        }
    }

    struct FakeAreas {
        lookups: RefCell<Vec<String>>,
    }

    impl FakeAreas {
        fn new() -> Self {
            Self {
                lookups: RefCell::new(Vec::new()),
            }
        }
    }

    impl AreaResolver for FakeAreas {
        fn resolve_area_id(&self, name: &str) -> Option<String> {
            self.lookups.borrow_mut().push(name.to_string());
            (name == "Москва").then(|| "1".to_string())
        }
    }

    fn backend_engineer() -> VacancyRecord {
        VacancyRecord::new(
            "Backend Engineer",
            "https://hh.ru/vacancy/1",
            Salary::Amount(120000),
            "Rust, PostgreSQL",
        )
    }

    fn senior_backend_engineer() -> VacancyRecord {
        VacancyRecord::new(
            "Senior Backend Engineer",
            "https://hh.ru/vacancy/2",
            Salary::Amount(250000),
            "",
        )
    }

    fn data_analyst() -> VacancyRecord {
        VacancyRecord::new(
            "Data Analyst",
            "https://www.superjob.ru/vakansii/analyst-3.html",
            Salary::NotSpecified,
            "Education: Higher. Experience: . Workplace: Remote. Work mode: Full time.",
        )
    }

    fn run_session(
        store: &JsonLinesStore,
        options: SessionOptions,
        hh: &FakeSource,
        sj: &FakeSource,
        areas: &FakeAreas,
        transcript: &str,
    ) -> (Result<RunSummary, SessionError>, String) {
        let sources: Vec<&dyn VacancySource> = vec![hh, sj];
        let session = Session::new(sources, areas, store.clone(), options);
        let mut input = Cursor::new(transcript.as_bytes().to_vec());
        let mut output = Vec::new();
        let result = session.run(&mut input, &mut output);
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_full_session_saves_and_narrows_by_exact_title() {
        let dir = TempDir::new().unwrap();
        let store = JsonLinesStore::new(dir.path().join("vacancies.json"));
        let hh = FakeSource::new("HeadHunter", vec![backend_engineer(), senior_backend_engineer()]);
        let sj = FakeSource::new("SuperJob", vec![data_analyst()]);
        let areas = FakeAreas::new();

        let (result, output) = run_session(
            &store,
            SessionOptions::default(),
            &hh,
            &sj,
            &areas,
            "engineer\n\n\n\nBackend Engineer\n",
        );

        let summary = result.unwrap();
        assert_eq!(summary.fetched, vec![("HeadHunter", 2), ("SuperJob", 1)]);
        assert_eq!(summary.displayed_matches, 1);

        // Everything fetched is persisted in provider order
        assert_eq!(
            store.query("").unwrap(),
            vec![backend_engineer(), senior_backend_engineer(), data_analyst()]
        );

        let hh_section = output.find("Results from HeadHunter:").unwrap();
        let sj_section = output.find("Results from SuperJob:").unwrap();
        let saved_section = output
            .find("Saved vacancies matching 'Backend Engineer':")
            .unwrap();
        assert!(hh_section < sj_section && sj_section < saved_section);

        let saved = &output[saved_section..];
        assert!(saved.contains("Title: Backend Engineer"));
        assert!(!saved.contains("Senior Backend Engineer"));
    }

    #[test]
    fn test_substring_mode_shows_all_store_matches() {
        let dir = TempDir::new().unwrap();
        let store = JsonLinesStore::new(dir.path().join("vacancies.json"));
        let hh = FakeSource::new("HeadHunter", vec![backend_engineer(), senior_backend_engineer()]);
        let sj = FakeSource::new("SuperJob", vec![data_analyst()]);
        let areas = FakeAreas::new();
        let options = SessionOptions {
            final_filter: FinalFilter::Substring,
            ..SessionOptions::default()
        };

        let (result, output) =
            run_session(&store, options, &hh, &sj, &areas, "engineer\n\n\n\nEngineer\n");

        assert_eq!(result.unwrap().displayed_matches, 2);
        let saved = &output[output.find("Saved vacancies").unwrap()..];
        assert!(saved.contains("Senior Backend Engineer"));
        assert!(!saved.contains("Data Analyst"));
    }

    #[test]
    fn test_exact_title_ignores_case_but_store_match_does_not() {
        let dir = TempDir::new().unwrap();
        let store = JsonLinesStore::new(dir.path().join("vacancies.json"));
        let hh = FakeSource::new("HeadHunter", vec![backend_engineer()]);
        let sj = FakeSource::new("SuperJob", vec![]);
        let areas = FakeAreas::new();

        // Store-level matching is case-sensitive, so a lowercase criterion finds nothing
        let (result, _) = run_session(
            &store,
            SessionOptions::default(),
            &hh,
            &sj,
            &areas,
            "backend\n\n\n\nbackend engineer\n",
        );
        assert_eq!(result.unwrap().displayed_matches, 0);

        let (result, _) = run_session(
            &store,
            SessionOptions::default(),
            &hh,
            &sj,
            &areas,
            "backend\n\n\n\nBackend Engineer\n",
        );
        assert_eq!(result.unwrap().displayed_matches, 1);
    }

    #[test]
    fn test_filters_are_passed_to_every_source() {
        let dir = TempDir::new().unwrap();
        let store = JsonLinesStore::new(dir.path().join("vacancies.json"));
        let hh = FakeSource::new("HeadHunter", vec![]);
        let sj = FakeSource::new("SuperJob", vec![]);
        let areas = FakeAreas::new();

        let (result, _) = run_session(
            &store,
            SessionOptions::default(),
            &hh,
            &sj,
            &areas,
            "rust\nМосква\n100 000\n200,000 rub\n\n",
        );
        result.unwrap();

        let expected = SearchQuery {
            text: "rust".to_string(),
            area_id: Some("1".to_string()),
            salary_min: Some(100000),
            salary_max: Some(200000),
        };
        assert_eq!(hh.seen.borrow().as_slice(), &[expected.clone()]);
        assert_eq!(sj.seen.borrow().as_slice(), &[expected]);
    }

    #[test]
    fn test_unknown_region_drops_area_and_blank_region_skips_lookup() {
        let dir = TempDir::new().unwrap();
        let store = JsonLinesStore::new(dir.path().join("vacancies.json"));
        let hh = FakeSource::new("HeadHunter", vec![]);
        let sj = FakeSource::new("SuperJob", vec![]);
        let areas = FakeAreas::new();

        let (result, _) = run_session(
            &store,
            SessionOptions::default(),
            &hh,
            &sj,
            &areas,
            "rust\nАтлантида\n\n\n\n",
        );
        result.unwrap();
        assert_eq!(hh.seen.borrow()[0].area_id, None);
        assert_eq!(areas.lookups.borrow().as_slice(), &["Атлантида".to_string()]);

        let (result, _) =
            run_session(&store, SessionOptions::default(), &hh, &sj, &areas, "rust\n\n\n\n\n");
        result.unwrap();
        assert_eq!(areas.lookups.borrow().len(), 1);
    }

    #[test]
    fn test_empty_source_does_not_affect_other_source() {
        let dir = TempDir::new().unwrap();
        let store = JsonLinesStore::new(dir.path().join("vacancies.json"));
        let hh = FakeSource::new("HeadHunter", vec![]);
        let sj = FakeSource::new("SuperJob", vec![data_analyst()]);
        let areas = FakeAreas::new();

        let (result, output) = run_session(
            &store,
            SessionOptions::default(),
            &hh,
            &sj,
            &areas,
            "analyst\n\n\n\nData Analyst\n",
        );

        let summary = result.unwrap();
        assert_eq!(summary.fetched, vec![("HeadHunter", 0), ("SuperJob", 1)]);
        assert_eq!(summary.displayed_matches, 1);
        assert!(output.contains("Results from HeadHunter:\nNo vacancies found."));
    }

    #[test]
    fn test_clear_before_run_discards_previous_results() {
        let dir = TempDir::new().unwrap();
        let store = JsonLinesStore::new(dir.path().join("vacancies.json"));
        store.append(&data_analyst()).unwrap();

        let hh = FakeSource::new("HeadHunter", vec![backend_engineer()]);
        let sj = FakeSource::new("SuperJob", vec![]);
        let areas = FakeAreas::new();

        let (result, _) = run_session(
            &store,
            SessionOptions::default(),
            &hh,
            &sj,
            &areas,
            "backend\n\n\n\n\n",
        );
        result.unwrap();

        assert_eq!(store.query("").unwrap(), vec![backend_engineer()]);
    }

    #[test]
    fn test_keep_previous_appends_after_old_results() {
        let dir = TempDir::new().unwrap();
        let store = JsonLinesStore::new(dir.path().join("vacancies.json"));
        store.append(&data_analyst()).unwrap();

        let hh = FakeSource::new("HeadHunter", vec![backend_engineer()]);
        let sj = FakeSource::new("SuperJob", vec![]);
        let areas = FakeAreas::new();
        let options = SessionOptions {
            clear_before_run: false,
            final_filter: FinalFilter::Substring,
        };

        let (result, _) = run_session(&store, options, &hh, &sj, &areas, "backend\n\n\n\n\n");

        assert_eq!(result.unwrap().displayed_matches, 2);
        assert_eq!(store.query("").unwrap(), vec![data_analyst(), backend_engineer()]);
    }

    #[test]
    fn test_malformed_store_surfaces_as_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vacancies.json");
        fs::write(&path, "{\"title\": \"broken\"\n").unwrap();
        let store = JsonLinesStore::new(&path);

        let hh = FakeSource::new("HeadHunter", vec![backend_engineer()]);
        let sj = FakeSource::new("SuperJob", vec![]);
        let areas = FakeAreas::new();
        let options = SessionOptions {
            clear_before_run: false,
            ..SessionOptions::default()
        };

        let (result, _) = run_session(&store, options, &hh, &sj, &areas, "backend\n\n\n\n\n");

        assert!(matches!(
            result,
            Err(SessionError::Store(StoreError::Decode { line: 1, .. }))
        ));
    }

    #[test]
    fn test_blank_query_is_asked_again() {
        let dir = TempDir::new().unwrap();
        let store = JsonLinesStore::new(dir.path().join("vacancies.json"));
        let hh = FakeSource::new("HeadHunter", vec![]);
        let sj = FakeSource::new("SuperJob", vec![]);
        let areas = FakeAreas::new();

        let (result, output) = run_session(
            &store,
            SessionOptions::default(),
            &hh,
            &sj,
            &areas,
            "\n  \nrust\n\n\n\n\n",
        );
        result.unwrap();

        assert_eq!(output.matches("Enter search query: ").count(), 3);
        assert_eq!(hh.seen.borrow()[0].text, "rust");
    }

    #[test]
    fn test_closed_input_aborts_session() {
        let dir = TempDir::new().unwrap();
        let store = JsonLinesStore::new(dir.path().join("vacancies.json"));
        let hh = FakeSource::new("HeadHunter", vec![backend_engineer()]);
        let sj = FakeSource::new("SuperJob", vec![]);
        let areas = FakeAreas::new();

        let (result, _) = run_session(&store, SessionOptions::default(), &hh, &sj, &areas, "");

        assert!(matches!(result, Err(SessionError::InputClosed)));
        assert!(hh.seen.borrow().is_empty());
    }

    #[test]
    fn test_parse_salary_bound() {
        assert_eq!(parse_salary_bound("120000"), Some(120000));
        assert_eq!(parse_salary_bound("120 000"), Some(120000));
        assert_eq!(parse_salary_bound("from 80,000 rub"), Some(80000));
        assert_eq!(parse_salary_bound(""), None);
        assert_eq!(parse_salary_bound("negotiable"), None);
    }

    #[test]
    fn test_parse_salary_bound_stops_at_decimal_point() {
        assert_eq!(parse_salary_bound("50000.00"), Some(50000));
        assert_eq!(parse_salary_bound("1.5"), Some(1));
        assert_eq!(parse_salary_bound("120 000.50 rub"), Some(120000));
    }

    #[test]
    fn test_parse_salary_bound_takes_first_of_two_numbers() {
        assert_eq!(parse_salary_bound("100000 200000"), Some(100000));
        assert_eq!(parse_salary_bound("50000 - 70000"), Some(50000));
        assert_eq!(parse_salary_bound("100'000"), Some(100000));
    }

    #[test]
    fn test_criterion_keeps_surrounding_spaces() {
        let dir = TempDir::new().unwrap();
        let store = JsonLinesStore::new(dir.path().join("vacancies.json"));
        let hh = FakeSource::new("HeadHunter", vec![backend_engineer(), data_analyst()]);
        let sj = FakeSource::new("SuperJob", vec![]);
        let areas = FakeAreas::new();
        let options = SessionOptions {
            final_filter: FinalFilter::Substring,
            ..SessionOptions::default()
        };

        let (result, output) =
            run_session(&store, options, &hh, &sj, &areas, "backend\n\n\n\nEngineer \r\n");
        assert_eq!(result.unwrap().displayed_matches, 0);
        assert!(output.contains("Saved vacancies matching 'Engineer ':"));

        let (result, _) =
            run_session(&store, options, &hh, &sj, &areas, "backend\n\n\n\nEngineer\n");
        assert_eq!(result.unwrap().displayed_matches, 1);
    }
}
