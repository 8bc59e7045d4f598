//! cda-extract: Raw event row decoding and parallel extraction.
//!
//! This crate turns a delimited export of marketplace events into typed
//! [`Transaction`](cda_types::Transaction)s.
//!
//! # Overview
//!
//! The row source is a CSV export with a header row and a fixed column
//! layout. Two columns hold semi-structured JSON-like blobs:
//!
//! ```text
//! app,ts,event,project_id,...,props,nums
//!      1   2      3           14    15
//! ```
//!
//! - [`KeyScanner`] pulls single values out of those blobs by key lookup
//!   without parsing them as JSON.
//! - [`RecordDecoder`] turns one row into one transaction.
//! - [`RecordExtractor`] drains all rows through a fixed-size pool of
//!   worker threads and collects every outcome.
//!
//! # Example
//!
//! ```rust
//! use cda_extract::RecordExtractor;
//!
//! let input = "app,ts,event,project_id,c4,c5,c6,c7,c8,c9,c10,c11,c12,c13,props,nums\n\
//!     seq,2024-04-15 02:15:07.167,BUY_ITEMS,4974,,,,,,,,,,,\
//!     \"{\"\"currencySymbol\"\":\"\"SFL\"\"}\",\"{\"\"currencyValueDecimal\"\":\"\"0.5\"\"}\"\n";
//!
//! let extractor = RecordExtractor::new(4).unwrap();
//! let transactions = extractor.extract(input.as_bytes()).unwrap();
//!
//! assert_eq!(transactions.len(), 1);
//! assert_eq!(transactions[0].currency_symbol, "SFL");
//! ```
//!
//! # Failure Policy
//!
//! Extraction is all-or-nothing. If any row fails to decode, the call
//! returns [`ExtractionError::Rows`] listing every failed row and no
//! transactions, even though the valid rows were decoded.
//!
//! # Ordering
//!
//! Workers finish rows out of their original order. Callers must not
//! depend on the order of the returned transactions.

mod decoder;
mod error;
mod extractor;
mod input;
mod scanner;

pub use decoder::{
    RecordDecoder, CURRENCY_SYMBOL_KEY, CURRENCY_VALUE_KEY, EVENT_COLUMN, NUMS_COLUMN,
    PROJECT_ID_COLUMN, PROPS_COLUMN, TIMESTAMP_COLUMN,
};
pub use error::{DecodeError, ExtractionError, RowFailure};
pub use extractor::RecordExtractor;
pub use input::decode_input;
pub use scanner::{FieldExtractor, KeyScanner};
