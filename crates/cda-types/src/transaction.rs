//! Transaction types.
//!
//! A [`Transaction`] is one marketplace event decoded from a raw row.
//! Transactions are immutable once decoded and carry the currency amount
//! in its native symbol; conversion to USD happens during aggregation.

use serde::{Deserialize, Serialize};

/// A decoded marketplace transaction.
///
/// # Fields
///
/// - `timestamp`: Free-form timestamp; the first space-delimited token is the date
/// - `event`: Event name (e.g., "BUY_ITEMS")
/// - `project_id`: Project the event belongs to
/// - `currency_symbol`: Symbol of the currency the value is denominated in
/// - `currency_value`: Amount in that currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Raw timestamp as found in the source row.
    #[serde(alias = "Timestamp")]
    pub timestamp: String,

    /// Event name.
    #[serde(alias = "Event")]
    pub event: String,

    /// Project identifier.
    #[serde(alias = "ProjectID")]
    pub project_id: String,

    /// Currency symbol, in the case found in the source.
    #[serde(alias = "CurrencySymbol")]
    pub currency_symbol: String,

    /// Amount denominated in `currency_symbol`.
    #[serde(alias = "CurrencyValue")]
    pub currency_value: f64,
}

impl Transaction {
    /// The date portion of the timestamp: everything before the first space.
    ///
    /// Timestamps without a space (e.g. RFC 3339 `2024-01-01T00:00:00Z`)
    /// are returned whole.
    pub fn date(&self) -> &str {
        self.timestamp
            .split(' ')
            .next()
            .unwrap_or(self.timestamp.as_str())
    }

    /// The currency symbol lower-cased, as used to key rate tables.
    pub fn normalized_symbol(&self) -> String {
        self.currency_symbol.to_lowercase()
    }
}
