//! Token catalog entries.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// A token from the external catalog (`/coins/list?include_platform=true`).
///
/// Several tokens may share a `symbol`; the `id` is the catalog's unique key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Catalog identifier (e.g., "sunflower-land").
    pub id: String,

    /// Ticker symbol as published by the catalog (usually lower-case).
    pub symbol: String,

    /// Display name.
    pub name: String,

    /// Chain name to contract address.
    #[serde(default, deserialize_with = "deserialize_platforms")]
    pub platforms: HashMap<String, String>,
}

impl Token {
    /// Create a token without platform data.
    pub fn new(id: impl Into<String>, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            name: name.into(),
            platforms: HashMap::new(),
        }
    }
}

/// Deserialize the platforms map, reading `null` addresses as empty strings.
fn deserialize_platforms<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<HashMap<String, Option<String>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(chain, address)| (chain, address.unwrap_or_default()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_catalog_entry() {
        let json = r#"{
            "id": "sunflower-land",
            "symbol": "sfl",
            "name": "Sunflower Land",
            "platforms": {"polygon-pos": "0xd1f9c58e33933a993a3891f8acfe05a68e1afc05"}
        }"#;

        let token: Token = serde_json::from_str(json).unwrap();
        assert_eq!(token.id, "sunflower-land");
        assert_eq!(token.symbol, "sfl");
        assert_eq!(
            token.platforms.get("polygon-pos").map(String::as_str),
            Some("0xd1f9c58e33933a993a3891f8acfe05a68e1afc05")
        );
    }

    #[test]
    fn test_null_platform_address() {
        let json = r#"{"id":"bitcoin","symbol":"btc","name":"Bitcoin","platforms":{"":null}}"#;
        let token: Token = serde_json::from_str(json).unwrap();
        assert_eq!(token.platforms.get("").map(String::as_str), Some(""));
    }

    #[test]
    fn test_missing_platforms() {
        let json = r#"{"id":"bitcoin","symbol":"btc","name":"Bitcoin"}"#;
        let token: Token = serde_json::from_str(json).unwrap();
        assert!(token.platforms.is_empty());
    }
}
