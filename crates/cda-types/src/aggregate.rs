//! Aggregated daily volume rows.

use serde::{Deserialize, Serialize};

/// Daily per-project volume summary.
///
/// Rows are keyed uniquely by `(date, project_id)` and accumulated
/// additively: every folded transaction bumps `transaction_count` by one
/// and adds its USD volume to `total_volume_usd`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedRow {
    /// Date portion of the contributing transactions' timestamps.
    #[serde(alias = "Date")]
    pub date: String,

    /// Project identifier.
    #[serde(alias = "ProjectID")]
    pub project_id: String,

    /// Number of transactions folded into this row.
    #[serde(alias = "Transactions")]
    pub transaction_count: u64,

    /// Sum of the contributing transactions' USD volume.
    #[serde(alias = "TotalVolumeUSD")]
    pub total_volume_usd: f64,
}

impl AggregatedRow {
    /// Create an empty row for a key.
    pub fn new(date: &str, project_id: &str) -> Self {
        Self {
            date: date.to_string(),
            project_id: project_id.to_string(),
            transaction_count: 0,
            total_volume_usd: 0.0,
        }
    }

    /// Fold one transaction's USD volume into the row.
    pub fn record(&mut self, volume_usd: f64) {
        self.transaction_count += 1;
        self.total_volume_usd += volume_usd;
    }
}
