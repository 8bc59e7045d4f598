//! Error types for row decoding and extraction.

use std::fmt;
use thiserror::Error;

/// Errors that can occur when decoding a row or the row stream.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The input as a whole is unreadable (no header, inconsistent
    /// record lengths, bad compression).
    #[error("malformed input: {0}")]
    Structure(String),

    /// The row is shorter than the fixed column layout.
    #[error("missing field at index {index} (row has {len} fields)")]
    MissingField { index: usize, len: usize },

    /// The currency value does not parse as a floating-point number.
    #[error("failed to parse currency value {value:?}: {reason}")]
    InvalidValue { value: String, reason: String },
}

impl From<csv::Error> for DecodeError {
    fn from(err: csv::Error) -> Self {
        DecodeError::Structure(err.to_string())
    }
}

/// A row-level decode failure with the row's position in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct RowFailure {
    /// 1-based line of the record in the input (0 if unknown).
    pub line: u64,

    /// Why the row failed.
    pub error: DecodeError,
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.error)
    }
}

/// Errors that can occur during extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The input could not be read as a row stream.
    #[error("failed to read input: {0}")]
    Decode(#[from] DecodeError),

    /// One or more rows failed to decode. No transactions are returned.
    #[error("errors occurred during extraction: {} of {total} rows failed (first: {})", .failures.len(), first_failure(.failures))]
    Rows {
        failures: Vec<RowFailure>,
        total: usize,
    },

    /// Worker count must be at least one.
    #[error("invalid worker count: {0}")]
    InvalidWorkerCount(usize),

    /// A worker thread panicked.
    #[error("extraction worker panicked")]
    WorkerPanicked,
}

fn first_failure(failures: &[RowFailure]) -> String {
    failures
        .first()
        .map(ToString::to_string)
        .unwrap_or_default()
}
