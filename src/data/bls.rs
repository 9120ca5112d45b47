//! BLS public API client
//!
//! Fetches a whole CPI time series from the Bureau of Labor Statistics public
//! API and parses it into [`DataPoint`]s. Individual records that cannot be
//! parsed are skipped; only a structurally broken response fails the fetch.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use super::{DataPoint, Month};

/// Base URL for the BLS v1 time series endpoint; the series id is appended
pub const BLS_BASE_URL: &str = "https://api.bls.gov/publicAPI/v1/timeseries/data/";

/// Errors that can occur when fetching a series from the upstream API
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Connection failure or non-success HTTP status
    #[error("Upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body is not the expected JSON structure
    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),
}

/// Something that can fetch every observation of a series
///
/// The cache depends on this rather than on [`BlsClient`] so that tests can
/// substitute their own implementation.
#[async_trait]
pub trait SeriesFetcher: Send + Sync {
    /// Fetches all observations of `series_id`, in upstream order
    async fn fetch_all(&self, series_id: &str) -> Result<Vec<DataPoint>, UpstreamError>;
}

#[async_trait]
impl<T: SeriesFetcher + ?Sized> SeriesFetcher for Arc<T> {
    async fn fetch_all(&self, series_id: &str) -> Result<Vec<DataPoint>, UpstreamError> {
        (**self).fetch_all(series_id).await
    }
}

/// Top-level BLS response
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(rename = "Results")]
    results: Option<ApiResults>,
}

/// Series entries stay raw; only the first one is decoded
#[derive(Debug, Deserialize)]
struct ApiResults {
    series: Option<Vec<Value>>,
}

/// Records are kept as raw JSON so that one bad record cannot fail the whole body
#[derive(Debug, Deserialize)]
struct ApiSeries {
    data: Option<Vec<Value>>,
}

/// Client for fetching CPI series from the BLS public API
#[derive(Debug, Clone)]
pub struct BlsClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Endpoint the series id is appended to as one path segment
    base_url: Url,
}

impl BlsClient {
    /// Creates a new BlsClient against the given base URL
    ///
    /// The default endpoint is [`BLS_BASE_URL`]; `cli::parse_base_url` turns a
    /// configured string into a usable base.
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            http_client: Client::new(),
            base_url,
        }
    }

    /// Replaces the underlying HTTP client (e.g. one built with a timeout)
    pub fn with_client(mut self, client: Client) -> Self {
        self.http_client = client;
        self
    }

    /// Appends `series_id` as a single percent-encoded path segment, so `/`,
    /// `?` and `#` in an id cannot leave the base path
    fn series_url(&self, series_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(series_id);
        }
        url
    }
}

#[async_trait]
impl SeriesFetcher for BlsClient {
    async fn fetch_all(&self, series_id: &str) -> Result<Vec<DataPoint>, UpstreamError> {
        let url = self.series_url(series_id);
        info!(series_id, url = %url, "Fetching series from upstream");

        let response = self
            .http_client
            .get(url)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;

        let points = parse_series_response(&body)?;
        info!(series_id, points = points.len(), "Fetched series");
        Ok(points)
    }
}

/// Parses a BLS response body into data points.
///
/// Only the first series in the response is used.
pub(crate) fn parse_series_response(body: &str) -> Result<Vec<DataPoint>, UpstreamError> {
    let response: ApiResponse = serde_json::from_str(body)
        .map_err(|e| UpstreamError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    let results = response
        .results
        .ok_or_else(|| UpstreamError::MalformedResponse("missing 'Results'".to_string()))?;

    let first_series = results
        .series
        .and_then(|series| series.into_iter().next())
        .ok_or_else(|| {
            UpstreamError::MalformedResponse("missing or empty 'series'".to_string())
        })?;
    let first_series: ApiSeries = serde_json::from_value(first_series)
        .map_err(|e| UpstreamError::MalformedResponse(format!("invalid first series: {}", e)))?;

    let records = first_series
        .data
        .filter(|data| !data.is_empty())
        .ok_or_else(|| UpstreamError::MalformedResponse("missing or empty 'data'".to_string()))?;

    let total = records.len();
    let points: Vec<DataPoint> = records.iter().filter_map(parse_record).collect();

    if points.len() < total {
        debug!(
            skipped = total - points.len(),
            total, "Skipped unparseable upstream records"
        );
    }

    Ok(points)
}

/// Parses one raw record, returning `None` if year, month or value is unusable
fn parse_record(record: &Value) -> Option<DataPoint> {
    let year = str_field(record, "year").and_then(|s| s.trim().parse::<i32>().ok());
    let month = str_field(record, "periodName").and_then(|s| s.parse::<Month>().ok());
    let value = str_field(record, "value").and_then(|s| s.trim().parse::<i64>().ok());

    let (Some(year), Some(month), Some(value)) = (year, month, value) else {
        debug!(record = %record, "Skipping upstream record");
        return None;
    };

    Some(DataPoint {
        year,
        month,
        value,
        notes: first_footnote(record),
    })
}

fn str_field<'a>(record: &'a Value, name: &str) -> Option<&'a str> {
    record.get(name).and_then(Value::as_str)
}

/// Text of the first footnote, or empty when there is none
fn first_footnote(record: &Value) -> String {
    record
        .get("footnotes")
        .and_then(Value::as_array)
        .and_then(|notes| notes.first())
        .and_then(|note| note.get("text"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
