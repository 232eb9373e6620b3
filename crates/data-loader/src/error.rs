//! Error types for the data-loader crate.
//!
//! Every failure here is fatal for startup: the recommendation engine cannot
//! be built from a catalog or ratings table it could not read.

use thiserror::Error;

/// Errors that can occur while loading the catalog and ratings tables
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The CSV header lacks a column the loader needs
    #[error("Missing required column '{column}' in {file}")]
    MissingColumn { file: String, column: String },

    /// A CSV record couldn't be decoded
    ///
    /// `line` is the 1-based line number reported by the CSV reader
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: u64,
        reason: String,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
