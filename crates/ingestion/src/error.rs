//! Error types for the ingestion crate.

use thiserror::Error;

/// Errors that can occur while reading forecast tables.
#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse forecast table: {0}")]
    TableParse(#[from] csv::Error),

    #[error("Invalid value in row {row}: {message}")]
    InvalidRow { row: u64, message: String },

    #[error("Invalid geometry in row {row}: {source}")]
    Geometry {
        row: u64,
        #[source]
        source: DecodeError,
    },
}

impl IngestionError {
    pub fn invalid_row(row: u64, message: impl Into<String>) -> Self {
        Self::InvalidRow {
            row,
            message: message.into(),
        }
    }
}

/// Errors from the EWKB point decoder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("encoded point is {actual} hex characters, need at least {expected}")]
    TooShort { expected: usize, actual: usize },

    #[error("non-hex character at position {position}")]
    InvalidHex { position: usize },
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestionError>;
