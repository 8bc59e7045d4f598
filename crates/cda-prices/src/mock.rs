//! Mock transport for testing.
//!
//! `MockTransport` answers `/coins/list` and `/simple/price` requests from
//! configured data, the same shapes the real API returns, and records every
//! call it receives.
//!
//! # Usage
//!
//! ```rust
//! use cda_prices::{MockTransport, Token};
//!
//! let mock = MockTransport::new()
//!     .with_catalog(vec![Token::new("bitcoin", "btc", "Bitcoin")])
//!     .with_price("bitcoin", 67000.0);
//! assert!(mock.calls().is_empty());
//! ```

use crate::error::PriceError;
use crate::transport::{PriceTransport, TransportResponse};
use cda_types::Token;
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use url::Url;

/// A request seen by [`MockTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub url: Url,
    pub bearer: Option<String>,
}

impl RecordedCall {
    /// Ids from the `ids` query parameter, in request order.
    pub fn ids(&self) -> Vec<String> {
        requested_ids(&self.url)
    }
}

/// Mock price API.
///
/// Scripted responses are served first, in order, regardless of URL.
/// Once the script is exhausted, requests are routed by path. Clones share
/// the script and call log.
#[derive(Debug, Default, Clone)]
pub struct MockTransport {
    /// Catalog returned from `/coins/list`.
    pub catalog: Vec<Token>,

    /// USD price per token id for `/simple/price`.
    pub prices: HashMap<String, f64>,

    /// Price requests containing any of these ids fail with a 500.
    pub failing_ids: HashSet<String>,

    script: Arc<Mutex<VecDeque<Result<TransportResponse, PriceError>>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockTransport {
    /// Create a new empty mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the token catalog (builder pattern).
    pub fn with_catalog(mut self, catalog: Vec<Token>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Set the price for a token id (builder pattern).
    pub fn with_price(mut self, id: &str, usd: f64) -> Self {
        self.prices.insert(id.to_string(), usd);
        self
    }

    /// Make every price request that includes `id` fail (builder pattern).
    pub fn with_failing_id(mut self, id: &str) -> Self {
        self.failing_ids.insert(id.to_string());
        self
    }

    /// Queue a response served before any routed ones (builder pattern).
    pub fn with_response(self, response: TransportResponse) -> Self {
        self.script.lock().push_back(Ok(response));
        self
    }

    /// Queue a connection-level failure (builder pattern).
    pub fn with_transport_error(self, message: &str) -> Self {
        self.script
            .lock()
            .push_back(Err(PriceError::Transport(message.to_string())));
        self
    }

    /// All calls received so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn route(&self, url: &Url) -> TransportResponse {
        let path = url.path();
        if path.ends_with("/coins/list") {
            return TransportResponse::ok(catalog_body(&self.catalog));
        }
        if path.ends_with("/simple/price") {
            let ids = requested_ids(url);
            if ids.iter().any(|id| self.failing_ids.contains(id)) {
                return TransportResponse::status(StatusCode::INTERNAL_SERVER_ERROR)
                    .with_body("mock upstream failure");
            }
            let mut body = Map::new();
            for id in ids {
                if let Some(price) = self.prices.get(&id) {
                    body.insert(id, json!({ "usd": price }));
                }
            }
            return TransportResponse::ok(Value::Object(body).to_string());
        }
        TransportResponse::status(StatusCode::NOT_FOUND)
    }
}

impl PriceTransport for MockTransport {
    async fn get(&self, url: Url, bearer: Option<&str>) -> Result<TransportResponse, PriceError> {
        self.calls.lock().push(RecordedCall {
            url: url.clone(),
            bearer: bearer.map(str::to_string),
        });

        let scripted = self.script.lock().pop_front();
        scripted.unwrap_or_else(|| Ok(self.route(&url)))
    }
}

fn requested_ids(url: &Url) -> Vec<String> {
    url.query_pairs()
        .find(|(key, _)| key == "ids")
        .map(|(_, value)| {
            value
                .split(',')
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn catalog_body(catalog: &[Token]) -> String {
    let entries: Vec<Value> = catalog
        .iter()
        .map(|token| {
            json!({
                "id": token.id,
                "symbol": token.symbol,
                "name": token.name,
                "platforms": token.platforms,
            })
        })
        .collect();
    Value::Array(entries).to_string()
}
