//! vcat-ingest - Vehicle Catalog Ingestion Service
//!
//! Pulls the full vehicle make catalog (and each make's vehicle types)
//! from the upstream vPIC feed and upserts it into the shared SQLite
//! catalog, emitting a structured run summary.
//!
//! Exit codes: 0 on completion (even with recorded per-make failures),
//! 1 when the make list cannot be fetched or an error escapes the run.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vcat_common::config::{Config, Overrides};
use vcat_common::db::init_db;

use vcat_ingest::{run_ingestion, RetryPolicy, SqliteCatalogStore, VpicClient};

/// Command-line arguments for vcat-ingest
#[derive(Parser, Debug)]
#[command(name = "vcat-ingest")]
#[command(about = "Vehicle catalog ingestion service for VCAT")]
#[command(version)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, env = "VCAT_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the SQLite catalog database
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Base URL of the upstream catalog API
    #[arg(short, long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::resolve(Overrides {
        config_file: args.config,
        database_path: args.database,
        base_url: args.base_url,
        api_port: None,
    })?;

    // One JSON object per log line: timestamp, level, message, fields
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.base_url,
        database = %config.database_path.display(),
        "Starting vcat-ingest"
    );

    let pool = init_db(&config.database_path).await?;
    let client = VpicClient::new(config.base_url.clone())
        .map_err(|e| anyhow::anyhow!("Failed to create catalog client: {}", e))?;
    let store = SqliteCatalogStore::new(pool.clone());

    let result = run_ingestion(&client, &store, &RetryPolicy::default()).await;

    pool.close().await;

    match result {
        Ok(_stats) => Ok(()),
        Err(err) => {
            error!(error = %err, "Fatal: failed to fetch makes list");
            std::process::exit(1);
        }
    }
}
