//! Error types

use thiserror::Error;

/// Error type shared by the extraction, reference-data and scoring code
#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed reference data: {0}")]
    MalformedReferenceData(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result alias
pub type Result<T> = std::result::Result<T, Error>;
