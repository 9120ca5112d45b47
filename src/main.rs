//! CPI Service - serve Consumer Price Index values over HTTP
//!
//! Fetches whole series from the BLS public API, keeps the latest one in memory
//! for the configured TTL and answers `GET /cpi/{series_id}/{year}/{month}`.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use cpi_service::cache::SeriesCache;
use cpi_service::cli::{Cli, ServiceConfig};
use cpi_service::data::BlsClient;
use cpi_service::server::{self, AppState};

/// Builds the upstream client from the validated configuration
fn build_fetcher(config: &ServiceConfig) -> Result<BlsClient, reqwest::Error> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = config.request_timeout {
        builder = builder.timeout(timeout);
    }
    Ok(BlsClient::with_base_url(config.base_url.clone()).with_client(builder.build()?))
}

async fn run(config: ServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!("CPI service starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Upstream: {}", config.base_url);
    info!("Cache TTL: {} hours", config.cache_ttl.num_hours());

    let fetcher = build_fetcher(&config)?;
    let state = Arc::new(AppState::new(SeriesCache::with_ttl(
        fetcher,
        config.cache_ttl,
    )));

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    server::serve(listener, state, server::shutdown_signal()).await?;

    info!("Server shutdown complete");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cpi_service=info")),
        )
        .init();

    let config = match ServiceConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err}");
            return ExitCode::from(2);
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
