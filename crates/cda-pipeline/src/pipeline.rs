//! Stage orchestration.
//!
//! Each stage reads its input from the blob store, does its work and writes
//! a JSON artifact back, so stages can run as separate invocations.

use crate::aggregator::Aggregator;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::sink::RowSink;
use crate::store::BlobStore;
use cda_extract::{decode_input, ExtractionError, RecordExtractor};
use cda_prices::{PriceFetcher, PriceTransport};
use cda_types::{AggregatedRow, CurrencyRateTable, SymbolPrices, Transaction};
use chrono::{NaiveDate, Utc};
use tracing::info;

/// Blob key for a day's price snapshot.
pub fn prices_key(date: NaiveDate) -> String {
    format!("prices/daily-token-prices-{}.json", date.format("%Y-%m-%d"))
}

/// Blob key for today's (UTC) price snapshot.
pub fn todays_prices_key() -> String {
    prices_key(Utc::now().date_naive())
}

/// Runs pipeline stages against one bucket of a blob store.
///
/// # Example
///
/// ```rust
/// use cda_pipeline::{MemoryBlobStore, Pipeline, PipelineConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), cda_pipeline::PipelineError> {
/// let config = PipelineConfig::default().with_bucket("chain-data");
/// let pipeline = Pipeline::new(MemoryBlobStore::new(), config)?;
/// assert_eq!(pipeline.bucket(), "chain-data");
/// # Ok(())
/// # }
/// ```
pub struct Pipeline<S: BlobStore> {
    store: S,
    config: PipelineConfig,
}

impl<S: BlobStore> Pipeline<S> {
    /// Create a pipeline. The config is validated first.
    pub fn new(store: S, config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn bucket(&self) -> &str {
        &self.config.bucket_name
    }

    /// Decode the raw export at `input_key` into transactions and store
    /// them as JSON at `output_key`. Returns the transaction count.
    pub async fn extract(&self, input_key: &str, output_key: &str) -> Result<usize, PipelineError> {
        info!("Starting data extraction: {} -> {}", input_key, output_key);

        let raw = self.store.get(self.bucket(), input_key).await?;
        let workers = self.config.workers_num;

        let transactions = tokio::task::spawn_blocking(move || {
            let input = decode_input(&raw).map_err(ExtractionError::from)?;
            RecordExtractor::new(workers)?.extract(&input)
        })
        .await??;

        let count = transactions.len();
        self.put_json(output_key, &transactions).await?;

        info!("Data extraction completed: {} transactions", count);
        Ok(count)
    }

    /// Aggregate the transactions at `input_key` using the rate table at
    /// `rates_key`, storing rows at `output_key`. Returns the row count.
    pub async fn transform(
        &self,
        input_key: &str,
        rates_key: &str,
        output_key: &str,
    ) -> Result<usize, PipelineError> {
        info!(
            "Starting data transformation: {} (rates {}) -> {}",
            input_key, rates_key, output_key
        );

        let transactions: Vec<Transaction> = self.get_json(input_key).await?;
        let rates: CurrencyRateTable = self.get_json(rates_key).await?;

        let rows = Aggregator::new(rates).aggregate(&transactions)?;
        let count = rows.len();
        self.put_json(output_key, &rows).await?;

        info!("Data transformation completed: {} rows", count);
        Ok(count)
    }

    /// Insert the rows at `input_key` into `sink`, stopping at the first
    /// failed insert. Returns the inserted count.
    pub async fn load<K: RowSink>(&self, input_key: &str, sink: &mut K) -> Result<usize, PipelineError> {
        info!("Starting data load: {}", input_key);

        let rows: Vec<AggregatedRow> = self.get_json(input_key).await?;
        for row in &rows {
            sink.insert(row).await?;
        }
        sink.finish().await?;

        info!("Data load completed: {} rows", rows.len());
        Ok(rows.len())
    }

    /// Fetch one USD price per allowed symbol and store the symbol to price
    /// object at `output_key`.
    pub async fn token_prices<T: PriceTransport + 'static>(
        &self,
        fetcher: &PriceFetcher<T>,
        allow_list: &[String],
        output_key: &str,
    ) -> Result<SymbolPrices, PipelineError> {
        if allow_list.is_empty() {
            return Err(PipelineError::Config(
                "token allow-list must not be empty".to_string(),
            ));
        }
        info!("Starting token price fetch for {:?} -> {}", allow_list, output_key);

        let tokens = fetcher.client().fetch_token_list(allow_list).await?;
        info!("Matched {} catalog tokens", tokens.len());

        let prices = fetcher.fetch_prices(&tokens).await?;
        self.put_json(output_key, &prices).await?;

        info!("Token price fetch completed: {} symbols", prices.len());
        Ok(prices)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<T, PipelineError> {
        let data = self.store.get(self.bucket(), key).await?;
        serde_json::from_slice(&data)
            .map_err(|e| PipelineError::Serialization(format!("{}: {}", key, e)))
    }

    async fn put_json<T: serde::Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), PipelineError> {
        let data = serde_json::to_vec(value)?;
        self.store.put(self.bucket(), key, data).await
    }
}
