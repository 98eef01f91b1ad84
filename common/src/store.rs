use crate::record::VacancyRecord;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while persisting or reading vacancies.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode vacancy: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("malformed vacancy on line {line} of {path:?}: {source}")]
    Decode {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Persistent sink for normalized vacancies.
pub trait VacancyStore {
    /// Appends one record without touching the ones already stored.
    fn append(&self, record: &VacancyRecord) -> Result<(), StoreError>;

    /// Returns stored records whose title contains `criteria`, in append order.
    ///
    /// Matching is case-sensitive; an empty criterion matches everything.
    fn query(&self, criteria: &str) -> Result<Vec<VacancyRecord>, StoreError>;

    /// Discards every stored record. Calling it on an empty store is a no-op.
    fn clear(&self) -> Result<(), StoreError>;
}

/// Stores one JSON object per line in a plain text file.
#[derive(Debug, Clone)]
pub struct JsonLinesStore {
    path: PathBuf,
}

impl JsonLinesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl VacancyStore for JsonLinesStore {
    fn append(&self, record: &VacancyRecord) -> Result<(), StoreError> {
        // Encode first so a failure never leaves half a line behind
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;

        file.write_all(line.as_bytes())
            .map_err(|e| self.io_error(e))?;

        debug!(path = ?self.path, title = %record.title, "appended vacancy");
        Ok(())
    }

    fn query(&self, criteria: &str) -> Result<Vec<VacancyRecord>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            // Nothing has been written yet
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        let mut matches = Vec::new();

        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| self.io_error(e))?;

            let record: VacancyRecord =
                serde_json::from_str(&line).map_err(|source| StoreError::Decode {
                    path: self.path.clone(),
                    line: index + 1,
                    source,
                })?;

            if record.title.contains(criteria) {
                matches.push(record);
            }
        }

        debug!(path = ?self.path, criteria, found = matches.len(), "queried vacancies");
        Ok(matches)
    }

    fn clear(&self) -> Result<(), StoreError> {
        File::create(&self.path).map_err(|e| self.io_error(e))?;
        debug!(path = ?self.path, "cleared vacancy store");
        Ok(())
    }
}
