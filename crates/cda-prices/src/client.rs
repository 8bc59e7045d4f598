//! Catalog and price requests against the CoinGecko-compatible API.
//!
//! # Retry policy
//!
//! Each price batch gets up to `max_attempts` requests (5 by default):
//!
//! 1. `200` decodes the body and returns.
//! 2. `429` with a positive `Retry-After` sleeps that many seconds and
//!    retries, unless this was the last attempt.
//! 3. `429` without a usable delay, or on the last attempt, fails with
//!    [`PriceError::RateLimited`].
//! 4. Any other status fails immediately with [`PriceError::Upstream`].
//!
//! Transport failures are never retried.

use crate::config::FetchConfig;
use crate::error::PriceError;
use crate::transport::{HttpTransport, PriceTransport, TransportResponse};
use cda_types::{PriceMap, Token};
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};
use url::Url;

const COINS_LIST_PATH: &str = "coins/list";
const SIMPLE_PRICE_PATH: &str = "simple/price";
const QUOTE_CURRENCY: &str = "usd";

/// Issues individual catalog and price requests.
///
/// Generic over the transport so tests can substitute [`MockTransport`](crate::MockTransport).
#[derive(Debug, Clone)]
pub struct PriceBatchClient<T = HttpTransport> {
    transport: T,
    base_url: Url,
    api_key: Option<String>,
    max_attempts: u32,
}

impl PriceBatchClient<HttpTransport> {
    /// Create a client backed by a pooled `reqwest` transport.
    pub fn new(config: &FetchConfig) -> Result<Self, PriceError> {
        Ok(Self::with_transport(HttpTransport::new(config)?, config))
    }
}

impl<T: PriceTransport> PriceBatchClient<T> {
    /// Create a client over an arbitrary transport.
    ///
    /// An attempt budget of zero is raised to one so every batch is
    /// requested at least once.
    pub fn with_transport(transport: T, config: &FetchConfig) -> Self {
        Self {
            transport,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            max_attempts: config.max_attempts.max(1),
        }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch the token catalog and keep the tokens whose symbol is in
    /// `allow_list`, in catalog order.
    ///
    /// Symbols match exactly; no case folding is applied.
    pub async fn fetch_token_list(&self, allow_list: &[String]) -> Result<Vec<Token>, PriceError> {
        let mut url = self.base_url.join(COINS_LIST_PATH)?;
        url.query_pairs_mut().append_pair("include_platform", "true");

        let response = self.get(url).await?;
        if response.status != StatusCode::OK {
            return Err(upstream(response));
        }

        let catalog: Vec<Token> = serde_json::from_str(&response.body).map_err(|e| {
            PriceError::Transport(format!("failed to decode token list: {}", e))
        })?;
        let catalog_len = catalog.len();

        let tokens: Vec<Token> = catalog
            .into_iter()
            .filter(|token| allow_list.contains(&token.symbol))
            .collect();

        debug!(
            "Kept {} of {} catalog tokens for {} allowed symbols",
            tokens.len(),
            catalog_len,
            allow_list.len()
        );
        Ok(tokens)
    }

    /// Fetch USD prices for one batch of tokens.
    ///
    /// Ids the API returns without a `usd` entry are omitted.
    pub async fn fetch_batch(&self, tokens: &[Token]) -> Result<PriceMap, PriceError> {
        let ids = tokens
            .iter()
            .map(|token| token.id.as_str())
            .collect::<Vec<_>>()
            .join(",");

        let mut url = self.base_url.join(SIMPLE_PRICE_PATH)?;
        url.query_pairs_mut()
            .append_pair("ids", &ids)
            .append_pair("vs_currencies", QUOTE_CURRENCY);

        for attempt in 1..=self.max_attempts {
            let response = self.get(url.clone()).await?;

            match response.status {
                StatusCode::OK => return decode_prices(&response.body),
                StatusCode::TOO_MANY_REQUESTS => match response.retry_delay() {
                    Some(delay) if attempt < self.max_attempts => {
                        warn!(
                            "Rate limited on attempt {}/{}, retrying in {}s",
                            attempt,
                            self.max_attempts,
                            delay.as_secs()
                        );
                        tokio::time::sleep(delay).await;
                    }
                    _ => return Err(PriceError::RateLimited { attempts: attempt }),
                },
                _ => return Err(upstream(response)),
            }
        }

        Err(PriceError::RateLimited {
            attempts: self.max_attempts,
        })
    }

    async fn get(&self, url: Url) -> Result<TransportResponse, PriceError> {
        debug!("GET {}", url);
        self.transport.get(url, self.api_key.as_deref()).await
    }
}

fn upstream(response: TransportResponse) -> PriceError {
    PriceError::Upstream {
        status: response.status.as_u16(),
        body: response.body,
    }
}

/// Decode `{"<id>": {"usd": <price>}, ...}` into id to price.
fn decode_prices(body: &str) -> Result<PriceMap, PriceError> {
    let raw: HashMap<String, HashMap<String, Value>> = serde_json::from_str(body)
        .map_err(|e| PriceError::Transport(format!("failed to decode price response: {}", e)))?;

    Ok(raw
        .into_iter()
        .filter_map(|(id, quotes)| {
            let price = quotes.get(QUOTE_CURRENCY)?.as_f64()?;
            Some((id, price))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use std::time::Duration;

    fn client(mock: &MockTransport) -> PriceBatchClient<MockTransport> {
        let config = FetchConfig::new("http://mock/api/v3").unwrap();
        PriceBatchClient::with_transport(mock.clone(), &config)
    }

    fn tokens(ids: &[&str]) -> Vec<Token> {
        ids.iter().map(|id| Token::new(*id, *id, *id)).collect()
    }

    #[test]
    fn test_decode_prices_skips_missing_usd() {
        let prices =
            decode_prices(r#"{"a":{"usd":1.5},"b":{},"c":{"eur":2.0},"d":{"usd":null}}"#).unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices["a"], 1.5);
    }

    #[test]
    fn test_decode_prices_rejects_garbage() {
        assert!(matches!(
            decode_prices("<html>"),
            Err(PriceError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_batch_request_shape() {
        let mock = MockTransport::new().with_price("a", 1.0).with_price("b", 2.0);
        let prices = client(&mock).fetch_batch(&tokens(&["a", "b", "c"])).await.unwrap();

        assert_eq!(prices.len(), 2);
        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].url.path(), "/api/v3/simple/price");
        assert_eq!(calls[0].ids(), vec!["a", "b", "c"]);
        assert!(calls[0]
            .url
            .query_pairs()
            .any(|(k, v)| k == "vs_currencies" && v == "usd"));
    }

    #[tokio::test]
    async fn test_bearer_sent_when_configured() {
        let mock = MockTransport::new();
        let config = FetchConfig::new("http://mock/api/v3")
            .unwrap()
            .with_api_key(Some("secret".to_string()));
        let client = PriceBatchClient::with_transport(mock.clone(), &config);

        client.fetch_batch(&tokens(&["a"])).await.unwrap();
        assert_eq!(mock.calls()[0].bearer.as_deref(), Some("secret"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_honored() {
        let mock = MockTransport::new()
            .with_price("a", 1.0)
            .with_response(TransportResponse::throttled(Some("2")));

        let start = tokio::time::Instant::now();
        let prices = client(&mock).fetch_batch(&tokens(&["a"])).await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(2));
        assert_eq!(prices["a"], 1.0);
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_throttled_without_retry_after() {
        let mock = MockTransport::new().with_response(TransportResponse::throttled(None));
        let result = client(&mock).fetch_batch(&tokens(&["a"])).await;

        assert!(matches!(result, Err(PriceError::RateLimited { attempts: 1 })));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_zero_retry_after_not_retried() {
        let mock = MockTransport::new().with_response(TransportResponse::throttled(Some("0")));
        let result = client(&mock).fetch_batch(&tokens(&["a"])).await;

        assert!(matches!(result, Err(PriceError::RateLimited { attempts: 1 })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_budget_exhausted() {
        let mut mock = MockTransport::new().with_price("a", 1.0);
        for _ in 0..5 {
            mock = mock.with_response(TransportResponse::throttled(Some("1")));
        }

        let result = client(&mock).fetch_batch(&tokens(&["a"])).await;

        assert!(matches!(result, Err(PriceError::RateLimited { attempts: 5 })));
        assert_eq!(mock.call_count(), 5);
    }

    #[tokio::test]
    async fn test_server_error_not_retried() {
        let mock = MockTransport::new().with_response(
            TransportResponse::status(StatusCode::SERVICE_UNAVAILABLE).with_body("maintenance"),
        );
        let result = client(&mock).fetch_batch(&tokens(&["a"])).await;

        match result {
            Err(PriceError::Upstream { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("expected Upstream, got {:?}", other),
        }
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_transport_error_not_retried() {
        let mock = MockTransport::new()
            .with_price("a", 1.0)
            .with_transport_error("connection reset by peer");
        let result = client(&mock).fetch_batch(&tokens(&["a"])).await;

        assert!(matches!(result, Err(PriceError::Transport(_))));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_undecodable_body_not_retried() {
        let mock = MockTransport::new()
            .with_price("a", 1.0)
            .with_response(TransportResponse::ok("<html>gateway</html>"));
        let result = client(&mock).fetch_batch(&tokens(&["a"])).await;

        assert!(matches!(result, Err(PriceError::Transport(_))));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_zero_attempt_budget_still_requests() {
        let mock = MockTransport::new().with_price("a", 1.0);
        let config = FetchConfig::new("http://mock/api/v3")
            .unwrap()
            .with_max_attempts(0);
        let client = PriceBatchClient::with_transport(mock.clone(), &config);

        let prices = client.fetch_batch(&tokens(&["a"])).await.unwrap();
        assert_eq!(prices["a"], 1.0);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_zero_attempt_budget_throttled() {
        let mock = MockTransport::new().with_response(TransportResponse::throttled(Some("1")));
        let config = FetchConfig::new("http://mock/api/v3")
            .unwrap()
            .with_max_attempts(0);
        let client = PriceBatchClient::with_transport(mock.clone(), &config);

        let result = client.fetch_batch(&tokens(&["a"])).await;
        assert!(matches!(result, Err(PriceError::RateLimited { attempts: 1 })));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_token_list_filters_exactly() {
        let mock = MockTransport::new().with_catalog(vec![
            Token::new("sunflower-land", "sfl", "Sunflower Land"),
            Token::new("bitcoin", "btc", "Bitcoin"),
            Token::new("fake-sfl", "SFL", "Shouty"),
            Token::new("sfl-bridged", "sfl", "Bridged SFL"),
        ]);

        let tokens = client(&mock)
            .fetch_token_list(&["sfl".to_string()])
            .await
            .unwrap();

        let ids: Vec<&str> = tokens.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["sunflower-land", "sfl-bridged"]);

        let call = &mock.calls()[0];
        assert_eq!(call.url.path(), "/api/v3/coins/list");
        assert_eq!(call.url.query(), Some("include_platform=true"));
    }

    #[tokio::test]
    async fn test_fetch_token_list_upstream_error() {
        let mock = MockTransport::new()
            .with_response(TransportResponse::status(StatusCode::UNAUTHORIZED));
        let result = client(&mock).fetch_token_list(&["sfl".to_string()]).await;

        assert!(matches!(result, Err(PriceError::Upstream { status: 401, .. })));
    }
}
