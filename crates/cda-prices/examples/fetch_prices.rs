//! Fetch live prices for a few symbols and print them.
//!
//! Run with: cargo run -p cda-prices --example fetch_prices -- btc,eth,sfl

use cda_prices::{FetchConfig, PriceBatchClient, PriceFetcher};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("cda_prices=debug,info")
        .init();

    let symbols: Vec<String> = env::args()
        .nth(1)
        .unwrap_or_else(|| "btc,eth".to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let config = FetchConfig::from_env()?;
    let client = PriceBatchClient::new(&config)?;

    println!("Fetching catalog for {:?}...", symbols);
    let tokens = client.fetch_token_list(&symbols).await?;
    println!("   {} matching tokens", tokens.len());

    let fetcher = PriceFetcher::new(client, config.batch_size)?;
    let prices = fetcher.fetch_prices(&tokens).await?;

    for (symbol, price) in &prices {
        println!("   {:>8} = ${}", symbol, price);
    }
    Ok(())
}
