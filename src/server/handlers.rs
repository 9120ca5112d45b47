//! HTTP handlers for the CPI service

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::{debug, error};

use super::error::ApiError;
use super::AppState;
use crate::cache::SnapshotInfo;
use crate::data::{DataPoint, Month, SeriesFetcher};

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// How long a fetched series is served before it is re-fetched
    pub cache_ttl_secs: i64,
    /// Currently cached snapshot, if any
    pub cache: Option<SnapshotInfo>,
}

/// Health check endpoint
pub async fn health<F: SeriesFetcher>(
    State(state): State<Arc<AppState<F>>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        cache_ttl_secs: state.cache.ttl().num_seconds(),
        cache: state.cache.snapshot_info().await,
    })
}

/// `GET /cpi/{series_id}/{year}/{month}`
///
/// `month` may be a month name (any case) or number.
pub async fn get_cpi<F: SeriesFetcher>(
    State(state): State<Arc<AppState<F>>>,
    Path((series_id, year, month)): Path<(String, String, String)>,
) -> Result<Json<DataPoint>, ApiError> {
    let year = year
        .trim()
        .parse::<i32>()
        .map_err(|_| ApiError::InvalidYear(year.clone()))?;
    let month = Month::from_path_segment(&month)?;

    match state.cache.get(&series_id, year, month).await {
        Ok(Some(point)) => Ok(Json(point)),
        Ok(None) => {
            debug!(series_id = %series_id, year, month = %month, "No CPI data for query");
            Err(ApiError::NotFound)
        }
        Err(e) => {
            error!(error = %e, series_id = %series_id, "CPI query failed");
            Err(e.into())
        }
    }
}
