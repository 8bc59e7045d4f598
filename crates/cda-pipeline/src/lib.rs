//! cda-pipeline: Stage orchestration for the chain data aggregator.
//!
//! This crate ties the extraction and price layers together into the four
//! batch stages:
//!
//! - **extract**: raw export -> `Vec<Transaction>` JSON
//! - **transform**: transactions + rate table -> `Vec<AggregatedRow>` JSON
//! - **load**: aggregated rows -> [`RowSink`]
//! - **token-prices**: token allow-list -> symbol to USD price JSON
//!
//! Artifacts move between stages through a [`BlobStore`]. The same rate
//! table written by `token-prices` is read back by `transform`.
//!
//! # Example
//!
//! ```rust
//! use cda_pipeline::{BlobStore, MemoryBlobStore, MemorySink, Pipeline, PipelineConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), cda_pipeline::PipelineError> {
//! let store = MemoryBlobStore::new();
//! let pipeline = Pipeline::new(store.clone(), PipelineConfig::default().with_bucket("demo"))?;
//!
//! store.put("demo", "tx.json", br#"[{"timestamp":"2024-04-15 10:00:00","event":"BUY_ITEMS","projectId":"4974","currencySymbol":"SFL","currencyValue":2.0}]"#.to_vec()).await?;
//! store.put("demo", "rates.json", br#"{"sfl":0.5}"#.to_vec()).await?;
//!
//! pipeline.transform("tx.json", "rates.json", "rows.json").await?;
//!
//! let mut sink = MemorySink::new();
//! pipeline.load("rows.json", &mut sink).await?;
//! assert_eq!(sink.rows[0].total_volume_usd, 1.0);
//! # Ok(())
//! # }
//! ```

mod aggregator;
pub mod config;
pub mod error;
mod pipeline;
mod sink;
mod store;

pub use aggregator::Aggregator;
pub use config::PipelineConfig;
pub use error::{PipelineError, RateLookupError};
pub use pipeline::{prices_key, todays_prices_key, Pipeline};
pub use sink::{CsvSink, MemorySink, RowSink, SINK_COLUMNS};
pub use store::{BlobStore, LocalBlobStore, MemoryBlobStore};
