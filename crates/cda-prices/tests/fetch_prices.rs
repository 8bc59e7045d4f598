//! End-to-end price fetching through the public API.
//!
//! Mock-backed tests run by default. Live tests hit the public CoinGecko API:
//!
//! cargo test -p cda-prices --test fetch_prices -- --ignored --nocapture

use cda_prices::{
    FetchConfig, MockTransport, PriceBatchClient, PriceError, PriceFetcher, Token,
    TransportResponse,
};
use std::time::Duration;

fn mock_config() -> FetchConfig {
    FetchConfig::new("http://mock/api/v3")
        .unwrap()
        .with_api_key(Some("demo-key".to_string()))
}

fn catalog() -> Vec<Token> {
    vec![
        Token::new("bitcoin", "btc", "Bitcoin"),
        Token::new("sunflower-land", "sfl", "Sunflower Land"),
        Token::new("ethereum", "eth", "Ethereum"),
        Token::new("sfl-wormhole", "sfl", "SFL (Wormhole)"),
        Token::new("dogecoin", "doge", "Dogecoin"),
    ]
}

#[tokio::test]
async fn test_catalog_to_prices() {
    let mock = MockTransport::new()
        .with_catalog(catalog())
        .with_price("bitcoin", 67000.0)
        .with_price("sunflower-land", 0.06)
        .with_price("sfl-wormhole", 0.07)
        .with_price("dogecoin", 0.15);

    let config = mock_config().with_batch_size(1);
    let client = PriceBatchClient::with_transport(mock.clone(), &config);
    let allow_list = vec!["sfl".to_string(), "btc".to_string()];

    let tokens = client.fetch_token_list(&allow_list).await.unwrap();
    assert_eq!(tokens.len(), 3);

    let fetcher = PriceFetcher::new(client, config.batch_size).unwrap();
    let prices = fetcher.fetch_prices(&tokens).await.unwrap();

    assert_eq!(prices.len(), 2);
    assert_eq!(prices["btc"], 67000.0);
    // "sfl-wormhole" sorts before "sunflower-land".
    assert_eq!(prices["sfl"], 0.07);
    assert!(!prices.contains_key("doge"));

    // One catalog call plus one price call per token.
    assert_eq!(mock.call_count(), 4);
    assert!(mock
        .calls()
        .iter()
        .all(|call| call.bearer.as_deref() == Some("demo-key")));
}

#[tokio::test]
async fn test_price_table_keeps_every_id() {
    let mock = MockTransport::new()
        .with_price("sunflower-land", 0.06)
        .with_price("sfl-wormhole", 0.07);
    let config = mock_config();
    let fetcher = PriceFetcher::new(
        PriceBatchClient::with_transport(mock, &config),
        config.batch_size,
    )
    .unwrap();

    let tokens: Vec<Token> = catalog().into_iter().filter(|t| t.symbol == "sfl").collect();
    let table = fetcher.fetch_table(&tokens).await.unwrap();

    assert_eq!(table.by_id.len(), 2);
    assert_eq!(table.by_symbol["sfl"].len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_retry_after_delays_batch() {
    let tokens = vec![Token::new("bitcoin", "btc", "Bitcoin")];
    let config = mock_config();

    let immediate = MockTransport::new().with_price("bitcoin", 67000.0);
    let fetcher = PriceFetcher::new(
        PriceBatchClient::with_transport(immediate, &config),
        config.batch_size,
    )
    .unwrap();
    let start = tokio::time::Instant::now();
    fetcher.fetch_prices(&tokens).await.unwrap();
    let baseline = start.elapsed();

    let throttled = MockTransport::new()
        .with_price("bitcoin", 67000.0)
        .with_response(TransportResponse::throttled(Some("2")));
    let fetcher = PriceFetcher::new(
        PriceBatchClient::with_transport(throttled.clone(), &config),
        config.batch_size,
    )
    .unwrap();
    let start = tokio::time::Instant::now();
    let prices = fetcher.fetch_prices(&tokens).await.unwrap();
    let delayed = start.elapsed();

    assert_eq!(prices["btc"], 67000.0);
    assert!(delayed >= baseline + Duration::from_secs(2));
    assert_eq!(throttled.call_count(), 2);
}

#[tokio::test]
async fn test_failed_batch_returns_no_prices() {
    let mock = MockTransport::new()
        .with_price("bitcoin", 67000.0)
        .with_price("ethereum", 3500.0)
        .with_failing_id("dogecoin");
    let config = mock_config().with_batch_size(2);
    let fetcher = PriceFetcher::new(
        PriceBatchClient::with_transport(mock, &config),
        config.batch_size,
    )
    .unwrap();

    let result = fetcher.fetch_prices(&catalog()).await;
    match result {
        Err(PriceError::Upstream { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "mock upstream failure");
        }
        other => panic!("expected Upstream error, got {:?}", other),
    }
}

#[tokio::test]
#[ignore] // Requires network access to CoinGecko API
async fn test_fetch_live_prices() {
    let config = FetchConfig::from_env().expect("valid COINGECKO_* environment");
    let client = PriceBatchClient::new(&config).expect("HTTP client");

    let tokens = client
        .fetch_token_list(&["btc".to_string(), "eth".to_string()])
        .await
        .expect("token list");
    println!("Got {} catalog tokens for btc/eth", tokens.len());
    assert!(!tokens.is_empty());

    let fetcher = PriceFetcher::new(client, config.batch_size).expect("fetcher");
    match fetcher.fetch_prices(&tokens).await {
        Ok(prices) => {
            for (symbol, price) in &prices {
                println!("   {} = ${}", symbol, price);
            }
            assert!(prices.contains_key("btc"));
        }
        Err(e) if e.is_rate_limited() => println!("Rate limited by public API: {}", e),
        Err(e) => panic!("Failed to fetch prices: {}", e),
    }
}
