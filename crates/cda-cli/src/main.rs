//! cda: Command-line entry point for the chain data aggregator.
//!
//! Each subcommand runs one pipeline stage against the local blob store
//! rooted at `DATA_ROOT`, inside the `BUCKET_NAME` bucket.

use anyhow::{Context, Result};
use cda_pipeline::{
    todays_prices_key, CsvSink, LocalBlobStore, Pipeline, PipelineConfig,
};
use cda_prices::{PriceBatchClient, PriceFetcher};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Instrument;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose logs follow `LOG_LEVEL` when `RUST_LOG` is unset.
const LOG_TARGETS: [&str; 4] = ["cda", "cda_pipeline", "cda_extract", "cda_prices"];

#[derive(Parser)]
#[command(name = "cda")]
#[command(author, version, about = "Blockchain data aggregator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract transactions from a raw export
    #[command(alias = "e")]
    Extract {
        /// Key of the raw export (CSV, optionally LZ4-compressed)
        #[arg(short, long)]
        input: String,

        /// Key to write the extracted transactions to
        #[arg(short, long)]
        output: String,
    },

    /// Aggregate extracted transactions into daily volume rows
    #[command(alias = "t")]
    Transform {
        /// Key of the extracted transactions
        #[arg(short, long)]
        input: String,

        /// Key to write the aggregated rows to
        #[arg(short, long)]
        output: String,

        /// Key of the currency rate table
        #[arg(short, long)]
        rates: String,
    },

    /// Load aggregated rows into the analytics sink
    #[command(alias = "l")]
    Load {
        /// Key of the aggregated rows
        #[arg(short, long)]
        input: String,

        /// CSV file to append to (default: SINK_PATH)
        #[arg(short, long)]
        destination: Option<PathBuf>,
    },

    /// Fetch daily USD prices for a list of token symbols
    TokenPrices {
        /// Comma-separated token symbols (e.g., sfl,matic)
        #[arg(long, value_delimiter = ',', required = true)]
        tokens: Vec<String>,

        /// Key to write the prices to (default: prices/daily-token-prices-<date>.json)
        #[arg(short, long)]
        output: Option<String>,
    },
}

impl Commands {
    fn stage(&self) -> &'static str {
        match self {
            Commands::Extract { .. } => "extract",
            Commands::Transform { .. } => "transform",
            Commands::Load { .. } => "load",
            Commands::TokenPrices { .. } => "token-prices",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = PipelineConfig::from_env().context("failed to load configuration")?;
    init_tracing(&config.log_level);
    config.validate().context("invalid configuration")?;

    let stage = cli.command.stage();
    run(cli.command, config)
        .instrument(tracing::info_span!("stage", stage))
        .await
        .with_context(|| format!("{} failed", stage))
}

fn init_tracing(log_level: &str) {
    let default_filter = LOG_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, log_level.to_lowercase()))
        .collect::<Vec<_>>()
        .join(",");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("warn,{}", default_filter).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run(command: Commands, config: PipelineConfig) -> Result<()> {
    let store = LocalBlobStore::new(&config.data_root);
    let pipeline = Pipeline::new(store, config)?;

    match command {
        Commands::Extract { input, output } => {
            pipeline.extract(&input, &output).await?;
        }
        Commands::Transform {
            input,
            output,
            rates,
        } => {
            pipeline.transform(&input, &rates, &output).await?;
        }
        Commands::Load { input, destination } => {
            let path = destination.unwrap_or_else(|| pipeline.config().sink_path.clone());
            let mut sink = CsvSink::open(&path)?;
            pipeline.load(&input, &mut sink).await?;
            tracing::info!("Rows appended to {}", path.display());
        }
        Commands::TokenPrices { tokens, output } => {
            let output = output.unwrap_or_else(todays_prices_key);
            let fetch_config = pipeline.config().fetch_config()?;
            let client = PriceBatchClient::new(&fetch_config)?;
            let fetcher = PriceFetcher::new(client, fetch_config.batch_size)?;

            let tokens: Vec<String> = tokens
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            pipeline.token_prices(&fetcher, &tokens, &output).await?;
        }
    }
    Ok(())
}
