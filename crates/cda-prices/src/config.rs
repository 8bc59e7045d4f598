//! Configuration for price fetching.
//!
//! # Environment Variables
//!
//! - `COINGECKO_BASE_URL`: API base (default: `https://api.coingecko.com/api/v3`)
//! - `COINGECKO_API_KEY`: Optional bearer credential
//! - `PRICE_BATCH_SIZE`: Token ids per price request (default: 50)

use crate::error::PriceError;
use std::env;
use std::time::Duration;
use url::Url;

/// Public CoinGecko API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Token ids per `/simple/price` request.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Total attempts per batch, including the first.
pub const MAX_ATTEMPTS: u32 = 5;

/// Per-request HTTP timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Parameters shared by the batch client and the fetcher.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    /// API base, always stored with a trailing slash so relative
    /// endpoint paths join beneath it.
    pub base_url: Url,

    /// Optional bearer credential sent with every request.
    pub api_key: Option<String>,

    /// Token ids per price request.
    pub batch_size: usize,

    /// Total attempts per batch when throttled.
    pub max_attempts: u32,

    /// Per-request HTTP timeout.
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: normalize_base(DEFAULT_BASE_URL).expect("default base URL is valid"),
            api_key: None,
            batch_size: DEFAULT_BATCH_SIZE,
            max_attempts: MAX_ATTEMPTS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl FetchConfig {
    /// Create a config for a specific API base.
    pub fn new(base_url: &str) -> Result<Self, PriceError> {
        Ok(Self {
            base_url: normalize_base(base_url)?,
            ..Self::default()
        })
    }

    /// Load from `COINGECKO_BASE_URL`, `COINGECKO_API_KEY` and `PRICE_BATCH_SIZE`.
    pub fn from_env() -> Result<Self, PriceError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PriceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("COINGECKO_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let batch_size = match lookup("PRICE_BATCH_SIZE") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                PriceError::Config(format!("PRICE_BATCH_SIZE is not a number: {}", raw))
            })?,
            None => DEFAULT_BATCH_SIZE,
        };

        let config = Self::new(&base_url)?
            .with_api_key(lookup("COINGECKO_API_KEY"))
            .with_batch_size(batch_size);
        config.validate()?;
        Ok(config)
    }

    /// Set the bearer credential. Empty strings count as absent.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the per-batch attempt budget.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Reject zero batch sizes and attempt budgets.
    pub fn validate(&self) -> Result<(), PriceError> {
        if self.batch_size == 0 {
            return Err(PriceError::Config("batch size must be positive".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(PriceError::Config("max attempts must be positive".to_string()));
        }
        Ok(())
    }
}

fn normalize_base(raw: &str) -> Result<Url, PriceError> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
