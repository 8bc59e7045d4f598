//! Row decoder for the marketplace event export.

use crate::error::DecodeError;
use crate::scanner::{FieldExtractor, KeyScanner};
use cda_types::Transaction;
use csv::StringRecord;

/// Column holding the event timestamp.
pub const TIMESTAMP_COLUMN: usize = 1;

/// Column holding the event name.
pub const EVENT_COLUMN: usize = 2;

/// Column holding the project identifier.
pub const PROJECT_ID_COLUMN: usize = 3;

/// Column holding the string properties blob.
pub const PROPS_COLUMN: usize = 14;

/// Column holding the numeric properties blob.
pub const NUMS_COLUMN: usize = 15;

/// Key of the currency symbol inside the properties blob.
pub const CURRENCY_SYMBOL_KEY: &str = "currencySymbol";

/// Key of the decimal currency value inside the numerics blob.
pub const CURRENCY_VALUE_KEY: &str = "currencyValueDecimal";

/// Decodes one raw row into one [`Transaction`].
///
/// Decoding is pure and the decoder holds no mutable state, so one
/// instance is shared by every extraction worker.
///
/// The blob extractor is a type parameter so a stricter parser can
/// replace [`KeyScanner`] without touching callers.
#[derive(Debug, Clone, Default)]
pub struct RecordDecoder<E = KeyScanner> {
    extractor: E,
}

impl RecordDecoder {
    /// Create a decoder using the default [`KeyScanner`].
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: FieldExtractor> RecordDecoder<E> {
    /// Create a decoder with a custom blob extractor.
    pub fn with_extractor(extractor: E) -> Self {
        Self { extractor }
    }

    /// Decode a single row.
    ///
    /// # Errors
    ///
    /// - `MissingField` if the row is shorter than the fixed layout
    /// - `InvalidValue` if the extracted currency value is not a finite float
    ///
    /// A missing or unterminated currency symbol is not an error; it
    /// decodes to whatever the scanner returns (possibly empty).
    pub fn decode(&self, record: &StringRecord) -> Result<Transaction, DecodeError> {
        let props = field(record, PROPS_COLUMN)?;
        let nums = field(record, NUMS_COLUMN)?;

        let currency_symbol = self.extractor.extract(props, CURRENCY_SYMBOL_KEY);
        let value = self.extractor.extract(nums, CURRENCY_VALUE_KEY);
        let currency_value = value
            .parse::<f64>()
            .map_err(|e| DecodeError::InvalidValue {
                value: value.to_string(),
                reason: e.to_string(),
            })?;
        // Non-finite values would serialize as JSON null.
        if !currency_value.is_finite() {
            return Err(DecodeError::InvalidValue {
                value: value.to_string(),
                reason: "value is out of range or not a number".to_string(),
            });
        }

        Ok(Transaction {
            timestamp: field(record, TIMESTAMP_COLUMN)?.to_string(),
            event: field(record, EVENT_COLUMN)?.to_string(),
            project_id: field(record, PROJECT_ID_COLUMN)?.to_string(),
            currency_symbol: currency_symbol.to_string(),
            currency_value,
        })
    }
}

fn field(record: &StringRecord, index: usize) -> Result<&str, DecodeError> {
    record.get(index).ok_or(DecodeError::MissingField {
        index,
        len: record.len(),
    })
}
