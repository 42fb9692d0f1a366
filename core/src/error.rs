use std::path::PathBuf;
use thiserror::Error;

/// The municipality directory could not be read. Fatal for a run.
#[derive(Error, Debug)]
#[error("Municipality lookup failed: {message}")]
pub struct LookupError {
    pub message: String,
}

impl LookupError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl From<rusqlite::Error> for LookupError {
    fn from(err: rusqlite::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// A per-municipality query failed. Never escapes the aggregator.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Query timed out: {0}")]
    Timeout(String),

    #[error("Query failed: {0}")]
    Failed(String),

    #[error("Cannot decode column '{column}': {detail}")]
    Decode { column: &'static str, detail: String },
}

impl QueryError {
    /// Only timeouts are worth another attempt.
    pub fn is_timeout(&self) -> bool {
        matches!(self, QueryError::Timeout(_))
    }
}

/// Output serialization or IO failure. Reported, never fatal.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Nothing to write: accumulated table is empty")]
    EmptyTable,

    #[error("Cannot create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV encoding error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Total cross-check failed: direct sum {direct}, per-year sum {by_year}")]
    CrossCheck { direct: f64, by_year: f64 },
}

pub type PipelineResult<T> = Result<T, PipelineError>;
