//! Error types for the price layer.
//!
//! External errors (`reqwest::Error`, `serde_json::Error`) are converted
//! into owned strings immediately so the enum stays free of generic
//! parameters and boxing.

use thiserror::Error;

/// Errors that can occur while fetching the token catalog or prices.
#[derive(Debug, Error)]
pub enum PriceError {
    /// Still throttled after exhausting retries, or throttled without a
    /// usable `Retry-After` delay.
    #[error("rate limited: 429 Too Many Requests after {attempts} attempt(s)")]
    RateLimited { attempts: u32 },

    /// Non-success, non-throttling response. Never retried.
    #[error("price API returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Connection failure or undecodable response body. Never retried.
    #[error("transport error: {0}")]
    Transport(String),

    /// Invalid fetch parameters (e.g., zero batch size, bad base URL).
    #[error("config error: {0}")]
    Config(String),

    /// A batch task panicked or was cancelled.
    #[error("batch task failed: {0}")]
    TaskFailed(String),
}

impl From<reqwest::Error> for PriceError {
    #[inline]
    fn from(err: reqwest::Error) -> Self {
        PriceError::Transport(err.to_string())
    }
}

impl From<url::ParseError> for PriceError {
    #[inline]
    fn from(err: url::ParseError) -> Self {
        PriceError::Config(format!("invalid URL: {}", err))
    }
}

impl PriceError {
    /// Returns true if the error came from API throttling.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, PriceError::RateLimited { .. })
    }
}
