//! Concurrent batched price fetching.
//!
//! Tokens are split into fixed-size batches in list order. Each batch runs
//! as its own task on a [`JoinSet`]; completed batches are sent over a
//! channel to a single reducer task, which is the only writer of the
//! merged [`PriceTable`].
//!
//! The first failing batch fails the whole fetch. Sibling tasks still in
//! flight are detached rather than aborted, and whatever they later send is
//! dropped along with the reducer.

use crate::client::PriceBatchClient;
use crate::error::PriceError;
use crate::transport::{HttpTransport, PriceTransport};
use cda_types::{PriceMap, SymbolPrices, Token};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info};

/// Prices resolved by one batch, keyed both ways.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchPrices {
    pub by_id: PriceMap,
    pub by_symbol: HashMap<String, PriceMap>,
}

impl BatchPrices {
    /// Index `prices` by the symbols of the tokens in `batch`.
    ///
    /// Tokens without a returned price are skipped.
    pub fn new(batch: &[Token], prices: PriceMap) -> Self {
        let mut by_symbol: HashMap<String, PriceMap> = HashMap::new();
        for token in batch {
            if let Some(price) = prices.get(&token.id) {
                by_symbol
                    .entry(token.symbol.clone())
                    .or_default()
                    .insert(token.id.clone(), *price);
            }
        }
        Self {
            by_id: prices,
            by_symbol,
        }
    }
}

/// Merged prices from every batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    /// Token id to USD price.
    pub by_id: PriceMap,

    /// Symbol to every (id, price) recorded for it, ordered by id.
    pub by_symbol: HashMap<String, BTreeMap<String, f64>>,
}

impl PriceTable {
    /// Fold one batch into the table.
    pub fn merge(&mut self, batch: BatchPrices) {
        self.by_id.extend(batch.by_id);
        for (symbol, prices) in batch.by_symbol {
            self.by_symbol.entry(symbol).or_default().extend(prices);
        }
    }

    /// One price per symbol: the price of the lexicographically smallest
    /// token id recorded for it.
    pub fn representative_prices(&self) -> SymbolPrices {
        self.by_symbol
            .iter()
            .filter_map(|(symbol, prices)| {
                let (_, price) = prices.iter().next()?;
                Some((symbol.clone(), *price))
            })
            .collect()
    }
}

/// Split `tokens` into consecutive batches of at most `batch_size`.
pub fn partition(tokens: &[Token], batch_size: usize) -> Vec<Vec<Token>> {
    if batch_size == 0 {
        return Vec::new();
    }
    tokens.chunks(batch_size).map(<[Token]>::to_vec).collect()
}

/// Fetches prices for a token list with one task per batch.
pub struct PriceFetcher<T = HttpTransport> {
    client: Arc<PriceBatchClient<T>>,
    batch_size: usize,
}

impl<T: PriceTransport + 'static> PriceFetcher<T> {
    /// Create a fetcher. A zero batch size is rejected.
    pub fn new(client: PriceBatchClient<T>, batch_size: usize) -> Result<Self, PriceError> {
        if batch_size == 0 {
            return Err(PriceError::Config("batch size must be positive".to_string()));
        }
        Ok(Self {
            client: Arc::new(client),
            batch_size,
        })
    }

    /// The shared batch client.
    pub fn client(&self) -> &PriceBatchClient<T> {
        &self.client
    }

    /// Batch size used for partitioning.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Fetch one representative USD price per symbol.
    pub async fn fetch_prices(&self, tokens: &[Token]) -> Result<SymbolPrices, PriceError> {
        Ok(self.fetch_table(tokens).await?.representative_prices())
    }

    /// Fetch and merge every batch, failing on the first batch error.
    pub async fn fetch_table(&self, tokens: &[Token]) -> Result<PriceTable, PriceError> {
        let batches = partition(tokens, self.batch_size);
        let total = batches.len();
        if total == 0 {
            debug!("No tokens to price");
            return Ok(PriceTable::default());
        }

        info!(
            "Fetching prices for {} tokens in {} batches",
            tokens.len(),
            total
        );

        // Capacity covers every batch, so senders never wait on the reducer.
        let (tx, mut rx) = mpsc::channel::<BatchPrices>(total);
        let reducer = tokio::spawn(async move {
            let mut table = PriceTable::default();
            let mut completed = 0usize;
            while let Some(batch) = rx.recv().await {
                table.merge(batch);
                completed += 1;
                info!("Price batches: {}/{}", completed, total);
            }
            table
        });

        let mut tasks = JoinSet::new();
        for batch in batches {
            let client = Arc::clone(&self.client);
            let tx = tx.clone();
            tasks.spawn(async move {
                let prices = client.fetch_batch(&batch).await?;
                if tx.send(BatchPrices::new(&batch, prices)).await.is_err() {
                    debug!("Reducer gone, discarding batch of {} tokens", batch.len());
                }
                Ok::<(), PriceError>(())
            });
        }
        drop(tx);

        while let Some(joined) = tasks.join_next().await {
            let outcome = joined
                .map_err(|e| PriceError::TaskFailed(e.to_string()))
                .and_then(|result| result);
            if let Err(err) = outcome {
                tasks.detach_all();
                reducer.abort();
                return Err(err);
            }
        }

        let table = reducer
            .await
            .map_err(|e| PriceError::TaskFailed(e.to_string()))?;
        info!(
            "Resolved {} token prices across {} symbols",
            table.by_id.len(),
            table.by_symbol.len()
        );
        Ok(table)
    }
}
