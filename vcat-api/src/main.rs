//! vcat-api - Vehicle Catalog Query Service
//!
//! Thin read-only HTTP API over the catalog the ingest service
//! maintains: pagination, substring search, lookup by make id.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vcat_common::config::{Config, Overrides};
use vcat_common::db::init_db;

use vcat_api::AppState;

/// Command-line arguments for vcat-api
#[derive(Parser, Debug)]
#[command(name = "vcat-api")]
#[command(about = "Vehicle catalog query service for VCAT")]
#[command(version)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, env = "VCAT_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the SQLite catalog database
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::resolve(Overrides {
        config_file: args.config,
        database_path: args.database,
        base_url: None,
        api_port: args.port,
    })?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        database = %config.database_path.display(),
        "Starting vcat-api"
    );

    let pool = init_db(&config.database_path).await?;
    let state = AppState::new(pool);
    let app = vcat_api::build_router(state);

    let listener =
        tokio::net::TcpListener::bind(("127.0.0.1", config.api_port)).await?;
    info!("Listening on http://127.0.0.1:{}", config.api_port);

    axum::serve(listener, app).await?;

    Ok(())
}
