use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the sales analysis pipeline.
#[derive(Error, Debug)]
pub enum SalesError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required column is absent from the source header.
    #[error("Schema violation: required column `{column}` is missing")]
    SchemaViolation { column: String },

    /// The source holds more rows than the configured ceiling.
    #[error("Source exceeds the row limit of {limit} rows")]
    RowLimitExceeded { limit: usize },

    /// The spreadsheet report could not be written.
    #[error("Failed to write report {path}: {reason}")]
    ReportWrite { path: PathBuf, reason: String },
}

/// Convenience alias used throughout the sales crates.
pub type Result<T> = std::result::Result<T, SalesError>;
