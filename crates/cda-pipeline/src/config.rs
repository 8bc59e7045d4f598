//! Pipeline configuration from environment variables.
//!
//! Outside production (`ENV` != `production`) a `.env` file in the working
//! directory is loaded first; variables already set in the process win.
//!
//! # Environment Variables
//!
//! - `LOG_LEVEL` (default: info)
//! - `DATA_ROOT` (default: ./data): root directory of the local blob store
//! - `BUCKET_NAME` (required)
//! - `COINGECKO_API_KEY` (optional)
//! - `COINGECKO_BASE_URL` (default: https://api.coingecko.com/api/v3)
//! - `WORKERS_NUM` (default: 10)
//! - `PRICE_BATCH_SIZE` (default: 50)
//! - `SINK_PATH` (default: ./data/marketplace_analytics.csv)

use crate::error::PipelineError;
use cda_prices::config::{DEFAULT_BASE_URL, DEFAULT_BATCH_SIZE};
use cda_prices::FetchConfig;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_DATA_ROOT: &str = "./data";
pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_SINK_PATH: &str = "./data/marketplace_analytics.csv";

/// Runtime configuration shared by every stage.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub log_level: String,
    pub data_root: PathBuf,
    pub bucket_name: String,
    pub coingecko_api_key: Option<String>,
    pub coingecko_base_url: String,
    pub workers_num: usize,
    pub price_batch_size: usize,
    pub sink_path: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            bucket_name: String::new(),
            coingecko_api_key: None,
            coingecko_base_url: DEFAULT_BASE_URL.to_string(),
            workers_num: DEFAULT_WORKERS,
            price_batch_size: DEFAULT_BATCH_SIZE,
            sink_path: PathBuf::from(DEFAULT_SINK_PATH),
        }
    }
}

impl PipelineConfig {
    /// Load `.env` (unless `ENV=production`), then read the process environment.
    ///
    /// A missing `.env` file is not an error; a malformed one is.
    pub fn from_env() -> Result<Self, PipelineError> {
        if env::var("ENV").as_deref() != Ok("production") {
            match dotenvy::dotenv() {
                Ok(path) => debug!("Loaded environment from {}", path.display()),
                Err(e) if e.not_found() => debug!("No .env file found"),
                Err(e) => {
                    return Err(PipelineError::Config(format!(
                        "error loading .env file: {}",
                        e
                    )))
                }
            }
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Does not validate.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            data_root: lookup("DATA_ROOT").map(PathBuf::from).unwrap_or(defaults.data_root),
            bucket_name: lookup("BUCKET_NAME").unwrap_or_default(),
            coingecko_api_key: lookup("COINGECKO_API_KEY").filter(|k| !k.is_empty()),
            coingecko_base_url: lookup("COINGECKO_BASE_URL")
                .unwrap_or(defaults.coingecko_base_url),
            workers_num: parse_var(&lookup, "WORKERS_NUM", defaults.workers_num)?,
            price_batch_size: parse_var(&lookup, "PRICE_BATCH_SIZE", defaults.price_batch_size)?,
            sink_path: lookup("SINK_PATH").map(PathBuf::from).unwrap_or(defaults.sink_path),
        })
    }

    /// Set the bucket name (builder pattern).
    pub fn with_bucket(mut self, bucket: &str) -> Self {
        self.bucket_name = bucket.to_string();
        self
    }

    /// Set the extraction worker count (builder pattern).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers_num = workers;
        self
    }

    /// Check required values and positive counts.
    ///
    /// Every missing variable is reported in one error.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let mut missing = Vec::new();
        if self.bucket_name.is_empty() {
            missing.push("BUCKET_NAME");
        }
        if self.data_root.as_os_str().is_empty() {
            missing.push("DATA_ROOT");
        }
        if self.coingecko_base_url.is_empty() {
            missing.push("COINGECKO_BASE_URL");
        }
        if !missing.is_empty() {
            return Err(PipelineError::Config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        if self.workers_num == 0 {
            return Err(PipelineError::Config("WORKERS_NUM must be positive".to_string()));
        }
        if self.price_batch_size == 0 {
            return Err(PipelineError::Config(
                "PRICE_BATCH_SIZE must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Price fetch settings derived from this config.
    pub fn fetch_config(&self) -> Result<FetchConfig, PipelineError> {
        let config = FetchConfig::new(&self.coingecko_base_url)?
            .with_api_key(self.coingecko_api_key.clone())
            .with_batch_size(self.price_batch_size);
        config.validate()?;
        Ok(config)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, PipelineError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| {
            PipelineError::Config(format!("error parsing {}: {:?} is not a number", key, raw))
        }),
        None => Ok(default),
    }
}
