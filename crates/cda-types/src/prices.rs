//! Price and rate tables.

use std::collections::{BTreeMap, HashMap};

/// Token id to USD price, as returned by one or more price batches.
pub type PriceMap = HashMap<String, f64>;

/// One representative USD price per symbol.
///
/// Ordered so the serialized JSON object is stable across runs.
pub type SymbolPrices = BTreeMap<String, f64>;

/// Lower-cased currency symbol to USD conversion rate.
///
/// This is the same shape as [`SymbolPrices`]: the price stage persists a
/// `SymbolPrices` object and the transform stage reloads it as a rate table.
pub type CurrencyRateTable = SymbolPrices;
