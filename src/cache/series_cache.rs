//! Read-through cache over a [`SeriesFetcher`]
//!
//! Provides a `SeriesCache` that keeps the most recently fetched series in a
//! single in-memory slot and answers year/month queries from it until the
//! snapshot expires.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::data::{DataPoint, Month, SeriesFetcher, SeriesSnapshot, UpstreamError};

/// Default time-to-live for a cached series in hours
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Metadata about the currently cached snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotInfo {
    /// Series the snapshot belongs to
    pub series_id: String,
    /// Number of observations in the snapshot
    pub points: usize,
    /// When the snapshot was fetched
    pub fetched_at: DateTime<Utc>,
    /// Whether the snapshot is past its TTL
    pub is_expired: bool,
}

/// In-memory read-through cache holding at most one series snapshot
///
/// The slot is tagged with the series id it was fetched for; asking for a
/// different series is a miss and replaces the slot. Concurrent misses are not
/// coalesced: each fetches, and the last one to finish wins the slot.
pub struct SeriesCache<F> {
    fetcher: F,
    ttl: Duration,
    slot: RwLock<Option<Arc<SeriesSnapshot>>>,
}

impl<F: SeriesFetcher> SeriesCache<F> {
    /// Creates a cache with the default 24 hour TTL
    pub fn new(fetcher: F) -> Self {
        Self::with_ttl(fetcher, Duration::hours(DEFAULT_TTL_HOURS))
    }

    /// Creates a cache with a custom TTL
    pub fn with_ttl(fetcher: F, ttl: Duration) -> Self {
        Self {
            fetcher,
            ttl,
            slot: RwLock::new(None),
        }
    }

    /// How long a snapshot is served before it is re-fetched
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Looks up the observation for `year`/`month` of `series_id`
    ///
    /// # Returns
    /// * `Ok(Some(DataPoint))` if the series has an observation for that month
    /// * `Ok(None)` if it does not
    /// * `Err(UpstreamError)` if the series had to be fetched and the fetch failed
    ///
    /// # Behavior
    /// - Serves from the cached snapshot when it is for this series and unexpired
    /// - Otherwise fetches the whole series and replaces the cached snapshot
    /// - A failed fetch is not cached and leaves the previous snapshot in place
    pub async fn get(
        &self,
        series_id: &str,
        year: i32,
        month: Month,
    ) -> Result<Option<DataPoint>, UpstreamError> {
        let snapshot = self.snapshot_for(series_id).await?;
        Ok(snapshot.find(year, month).cloned())
    }

    /// Returns metadata about the cached snapshot, if any
    pub async fn snapshot_info(&self) -> Option<SnapshotInfo> {
        let slot = self.slot.read().await;
        slot.as_ref().map(|snapshot| SnapshotInfo {
            series_id: snapshot.series_id.clone(),
            points: snapshot.points.len(),
            fetched_at: snapshot.fetched_at,
            is_expired: snapshot.is_expired_at(self.ttl, Utc::now()),
        })
    }

    async fn snapshot_for(&self, series_id: &str) -> Result<Arc<SeriesSnapshot>, UpstreamError> {
        if let Some(snapshot) = self.fresh_snapshot(series_id).await {
            debug!(series_id, "Cache hit");
            return Ok(snapshot);
        }

        debug!(series_id, "Cache miss");

        // The lock is not held across the fetch
        let points = self.fetcher.fetch_all(series_id).await.map_err(|e| {
            warn!(series_id, error = %e, "Series fetch failed");
            e
        })?;

        let snapshot = Arc::new(SeriesSnapshot::new(series_id, points));
        *self.slot.write().await = Some(Arc::clone(&snapshot));
        info!(
            series_id,
            points = snapshot.points.len(),
            "Cached series snapshot"
        );

        Ok(snapshot)
    }

    async fn fresh_snapshot(&self, series_id: &str) -> Option<Arc<SeriesSnapshot>> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|s| s.series_id == series_id && !s.is_expired_at(self.ttl, Utc::now()))
            .cloned()
    }
}
