//! # cda-prices
//!
//! External price data for the chain data aggregator.
//!
//! The crate talks to a CoinGecko-compatible API in two steps:
//!
//! 1. [`PriceBatchClient::fetch_token_list`] pulls the token catalog and
//!    keeps the tokens whose symbol is on an allow-list.
//! 2. [`PriceFetcher::fetch_prices`] splits those tokens into batches,
//!    prices every batch concurrently, and reduces the results to one USD
//!    price per symbol.
//!
//! ## Design Principles
//!
//! - **Transport seam**: all network access goes through [`PriceTransport`].
//!   [`HttpTransport`] wraps a pooled `reqwest` client; [`MockTransport`]
//!   serves canned responses for tests.
//!
//! - **Bounded retries**: throttled batches honor `Retry-After` for up to
//!   five attempts. Everything else fails immediately.
//!
//! - **Fail-closed**: one failed batch fails the whole fetch. No partial
//!   price table is ever returned.
//!
//! - **Deterministic**: when several token ids share a symbol, the price
//!   of the lexicographically smallest id wins.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cda_prices::{FetchConfig, PriceBatchClient, PriceFetcher};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = FetchConfig::from_env()?;
//!     let client = PriceBatchClient::new(&config)?;
//!
//!     let tokens = client.fetch_token_list(&["btc".to_string()]).await?;
//!     let fetcher = PriceFetcher::new(client, config.batch_size)?;
//!     let prices = fetcher.fetch_prices(&tokens).await?;
//!
//!     println!("{:?}", prices);
//!     Ok(())
//! }
//! ```
//!
//! ## Testing with MockTransport
//!
//! ```rust
//! use cda_prices::{FetchConfig, MockTransport, PriceBatchClient, PriceFetcher, Token};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = MockTransport::new().with_price("bitcoin", 67000.0);
//!     let config = FetchConfig::default();
//!     let client = PriceBatchClient::with_transport(mock, &config);
//!     let fetcher = PriceFetcher::new(client, config.batch_size).unwrap();
//!
//!     let tokens = vec![Token::new("bitcoin", "btc", "Bitcoin")];
//!     let prices = fetcher.fetch_prices(&tokens).await.unwrap();
//!     assert_eq!(prices["btc"], 67000.0);
//! }
//! ```

mod client;
pub mod config;
pub mod error;
mod fetcher;
mod mock;
mod transport;

pub use client::PriceBatchClient;
pub use config::FetchConfig;
pub use error::PriceError;
pub use fetcher::{partition, BatchPrices, PriceFetcher, PriceTable};
pub use mock::{MockTransport, RecordedCall};
pub use transport::{HttpTransport, PriceTransport, TransportResponse};

// Re-export the shared types that appear in our public API.
pub use cda_types::{PriceMap, SymbolPrices, Token};
