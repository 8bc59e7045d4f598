//! cda-types: Shared data structures for the chain data aggregator.
//!
//! This crate defines the records that move between pipeline stages:
//! - [`Transaction`] - A marketplace event decoded from one raw row
//! - [`Token`] - An entry of the external token catalog
//! - [`AggregatedRow`] - Daily per-project volume summary
//! - [`CurrencyRateTable`] - Lower-cased symbol to USD rate
//!
//! All records serialize to the JSON forms exchanged through the blob store.
//!
//! # Example
//!
//! ```rust
//! use cda_types::{AggregatedRow, Transaction};
//!
//! let tx = Transaction {
//!     timestamp: "2024-04-15 02:15:07.167".to_string(),
//!     event: "BUY_ITEMS".to_string(),
//!     project_id: "4974".to_string(),
//!     currency_symbol: "SFL".to_string(),
//!     currency_value: 0.5,
//! };
//!
//! let mut row = AggregatedRow::new(tx.date(), &tx.project_id);
//! row.record(tx.currency_value * 2.0);
//! assert_eq!(row.transaction_count, 1);
//! assert_eq!(row.date, "2024-04-15");
//! ```

mod aggregate;
mod prices;
mod token;
mod transaction;

pub use aggregate::AggregatedRow;
pub use prices::{CurrencyRateTable, PriceMap, SymbolPrices};
pub use token::Token;
pub use transaction::Transaction;
