//! Error types for the pipeline stages.

use cda_extract::ExtractionError;
use cda_prices::PriceError;
use thiserror::Error;

/// A transaction's currency has no entry in the rate table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing exchange rate for {symbol}")]
pub struct RateLookupError {
    /// Lower-cased currency symbol that was looked up.
    pub symbol: String,
}

/// Errors that can occur while running a pipeline stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Error from row extraction.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Error from the price layer.
    #[error("price error: {0}")]
    Prices(#[from] PriceError),

    /// Error from aggregation.
    #[error("transform error: {0}")]
    RateLookup(#[from] RateLookupError),

    /// Blob store get/put failed.
    #[error("store error for {bucket}/{key}: {reason}")]
    Store {
        bucket: String,
        key: String,
        reason: String,
    },

    /// Sink insert or flush failed.
    #[error("sink error: {0}")]
    Sink(String),

    /// JSON encoding or decoding of a stage artifact failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Missing or invalid configuration.
    #[error("config error: {0}")]
    Config(String),

    /// A blocking stage task panicked or was cancelled.
    #[error("task failed: {0}")]
    TaskFailed(String),
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::Sink(err.to_string())
    }
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(err: tokio::task::JoinError) -> Self {
        PipelineError::TaskFailed(err.to_string())
    }
}

impl PipelineError {
    pub(crate) fn store(bucket: &str, key: &str, reason: impl ToString) -> Self {
        PipelineError::Store {
            bucket: bucket.to_string(),
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}
