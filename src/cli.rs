//! Command-line interface parsing for the CPI service
//!
//! This module handles parsing of CLI arguments (with environment variable
//! fallbacks) using clap, and turns them into a validated [`ServiceConfig`].

use std::net::SocketAddr;
use std::time::Duration as StdDuration;

use chrono::Duration;
use clap::Parser;
use reqwest::Url;
use thiserror::Error;

use crate::cache::DEFAULT_TTL_HOURS;
use crate::data::bls::BLS_BASE_URL;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The upstream base URL is not an absolute http(s) URL
    #[error("Invalid base URL: '{0}'. Expected an absolute http or https URL")]
    InvalidBaseUrl(String),

    /// The cache TTL is negative or too large to represent
    #[error("Invalid cache TTL: {0} hours. Must be zero or more and fit in a duration")]
    InvalidTtl(i64),
}

/// CPI service - serve Consumer Price Index values from the BLS public API
#[derive(Parser, Debug)]
#[command(name = "cpi-service")]
#[command(about = "HTTP service for monthly CPI values backed by the BLS public API")]
#[command(version)]
pub struct Cli {
    /// Address the HTTP server listens on
    #[arg(long, env = "CPI_LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: SocketAddr,

    /// Upstream endpoint the series id is appended to
    #[arg(long, env = "CPI_BASE_URL", default_value = BLS_BASE_URL)]
    pub base_url: String,

    /// How long a fetched series is served from memory, in hours
    #[arg(long, env = "CPI_CACHE_TTL_HOURS", default_value_t = DEFAULT_TTL_HOURS, allow_negative_numbers = true)]
    pub cache_ttl_hours: i64,

    /// Timeout for upstream requests, in seconds (no timeout if unset)
    #[arg(long, env = "CPI_TIMEOUT_SECS", value_name = "SECS")]
    pub timeout_secs: Option<u64>,
}

/// Validated runtime configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address the HTTP server listens on
    pub listen_addr: SocketAddr,
    /// Upstream endpoint, path always ending in `/`
    pub base_url: Url,
    /// Snapshot time-to-live
    pub cache_ttl: Duration,
    /// Upstream request timeout
    pub request_timeout: Option<StdDuration>,
}

/// Validates an upstream base URL, adding a trailing `/` to its path if missing.
///
/// # Returns
/// * `Ok(Url)` with the normalised URL
/// * `Err(CliError::InvalidBaseUrl)` if it is not an absolute http(s) URL
pub fn parse_base_url(raw: &str) -> Result<Url, CliError> {
    let mut url = Url::parse(raw).map_err(|_| CliError::InvalidBaseUrl(raw.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
        return Err(CliError::InvalidBaseUrl(raw.to_string()));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

impl ServiceConfig {
    /// Creates a ServiceConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(ServiceConfig)` with validated settings
    /// * `Err(CliError)` if the base URL or TTL is invalid
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let ttl_hours = cli.cache_ttl_hours;
        let cache_ttl = Duration::try_hours(ttl_hours)
            .filter(|_| ttl_hours >= 0)
            .ok_or(CliError::InvalidTtl(ttl_hours))?;

        Ok(ServiceConfig {
            listen_addr: cli.listen_addr,
            base_url: parse_base_url(&cli.base_url)?,
            cache_ttl,
            request_timeout: cli.timeout_secs.map(StdDuration::from_secs),
        })
    }
}
