use thiserror::Error;

#[derive(Error, Debug)]
pub enum BoqError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("No input workbooks found in {0}")]
    NoInputFound(String),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Oracle call failed: {0}")]
    Oracle(String),

    #[error("Oracle call timed out after {0}s")]
    OracleTimeout(u64),

    #[error("{0} input file(s) failed")]
    FilesFailed(usize),

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Common(#[from] boq_tagger_common::Error),
}

pub type Result<T> = std::result::Result<T, BoqError>;
