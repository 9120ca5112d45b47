//! Cache module for serving series data from memory
//!
//! This module provides a read-through cache that fetches a whole series from
//! the upstream API once and answers queries from the stored snapshot until its
//! TTL (24 hours by default) runs out.

mod series_cache;

pub use series_cache::{SeriesCache, SnapshotInfo, DEFAULT_TTL_HOURS};
