//! Targeted key lookup in semi-structured blobs.
//!
//! The `props` and `nums` columns look like JSON objects but are not
//! guaranteed to be well-formed. Rather than parse them, we locate a
//! quoted key and read the string that follows it.

/// Pulls a single value out of a blob by key.
///
/// Implementations must be pure: callers share one extractor across
/// worker threads without synchronization.
pub trait FieldExtractor: Send + Sync {
    /// Return the value stored under `key`, or an empty string when the
    /// key is absent.
    fn extract<'a>(&self, blob: &'a str, key: &str) -> &'a str;
}

/// Key-value scanner with a fixed fallback contract.
///
/// For a blob like `{"currencySymbol":"SFL","chainId":"137"}` and key
/// `currencySymbol`:
///
/// 1. Find the first occurrence of the quoted key `"currencySymbol"`.
/// 2. Skip the key plus two bytes (the `:` separator and the byte after
///    it, normally the value's opening quote).
/// 3. Skip one more quote if present (covers `": "` style separators).
/// 4. Return everything up to the next `"`, or up to the end of the blob
///    when no closing quote exists.
///
/// A missing key yields `""`. An unterminated value runs to the end of
/// the blob. Neither is an error; the numeric conversion downstream is
/// the only place where a malformed value is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyScanner;

/// Bytes skipped between the end of the quoted key and the value.
const SEPARATOR_WIDTH: usize = 2;

impl FieldExtractor for KeyScanner {
    fn extract<'a>(&self, blob: &'a str, key: &str) -> &'a str {
        let quoted_key = format!("\"{}\"", key);
        let Some(key_start) = blob.find(&quoted_key) else {
            return "";
        };

        let mut start = key_start + quoted_key.len() + SEPARATOR_WIDTH;
        if blob.as_bytes().get(start) == Some(&b'"') {
            start += 1;
        }

        // Past the end, or inside a multi-byte character.
        let Some(rest) = blob.get(start..) else {
            return "";
        };

        let end = rest.find('"').unwrap_or(rest.len());
        &rest[..end]
    }
}
