//! Daily per-project volume aggregation.

use crate::error::RateLookupError;
use cda_types::{AggregatedRow, CurrencyRateTable, Transaction};
use std::collections::HashMap;
use tracing::debug;

/// Folds transactions into one [`AggregatedRow`] per `(date, project_id)`.
///
/// The date is the part of the timestamp before the first space, so
/// `"2024-04-15 02:15:07.167"` groups under `"2024-04-15"` while an
/// ISO-8601 timestamp without a space is used whole.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    rates: CurrencyRateTable,
}

impl Aggregator {
    /// Create an aggregator over a lower-cased symbol to USD rate table.
    pub fn new(rates: CurrencyRateTable) -> Self {
        Self { rates }
    }

    /// The rate table in use.
    pub fn rates(&self) -> &CurrencyRateTable {
        &self.rates
    }

    /// Aggregate `transactions`.
    ///
    /// Fails on the first transaction whose lower-cased currency symbol has
    /// no rate; rows folded before that point are discarded. Rows are
    /// returned sorted by date, then project id.
    pub fn aggregate(
        &self,
        transactions: &[Transaction],
    ) -> Result<Vec<AggregatedRow>, RateLookupError> {
        let mut rows: HashMap<(&str, &str), AggregatedRow> = HashMap::new();

        for tx in transactions {
            let symbol = tx.normalized_symbol();
            let rate = *self
                .rates
                .get(&symbol)
                .ok_or(RateLookupError { symbol })?;

            let date = tx.date();
            rows.entry((date, tx.project_id.as_str()))
                .or_insert_with(|| AggregatedRow::new(date, &tx.project_id))
                .record(tx.currency_value * rate);
        }

        let mut rows: Vec<AggregatedRow> = rows.into_values().collect();
        rows.sort_by(|a, b| (&a.date, &a.project_id).cmp(&(&b.date, &b.project_id)));

        debug!(
            "Aggregated {} transactions into {} rows",
            transactions.len(),
            rows.len()
        );
        Ok(rows)
    }
}
