//! Core data models for the CPI service
//!
//! This module contains the data types shared by the upstream fetcher, the
//! read-through cache and the HTTP layer: monthly CPI observations, the month
//! enumeration and the cached series snapshot.

pub mod bls;

pub use bls::{BlsClient, SeriesFetcher, UpstreamError};

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;

/// Calendar month of a CPI observation
///
/// Serialized as its number (1-12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u8")]
pub enum Month {
    January = 1,
    February = 2,
    March = 3,
    April = 4,
    May = 5,
    June = 6,
    July = 7,
    August = 8,
    September = 9,
    October = 10,
    November = 11,
    December = 12,
}

/// Error returned when a string or number does not name a month
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid month: '{0}'. Expected a month name (January-December) or number (1-12)")]
pub struct InvalidMonth(pub String);

impl Month {
    /// All months in calendar order
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// Month number, 1 for January through 12 for December
    pub fn number(self) -> u8 {
        self as u8
    }

    /// English month name as used by the BLS `periodName` field
    pub fn name(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    /// Looks up a month by its number (1-12)
    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.get(usize::from(number).checked_sub(1)?).copied()
    }

    /// Parses a month from a request path segment.
    ///
    /// Unlike [`FromStr`], which only accepts the exact upstream spelling, this
    /// accepts a month name in any letter case or the month number.
    pub fn from_path_segment(segment: &str) -> Result<Self, InvalidMonth> {
        let trimmed = segment.trim();
        if let Ok(number) = trimmed.parse::<u8>() {
            return Self::from_number(number).ok_or_else(|| InvalidMonth(segment.to_string()));
        }
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| InvalidMonth(segment.to_string()))
    }
}

impl FromStr for Month {
    type Err = InvalidMonth;

    /// Exact, case-sensitive match against the upstream month names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| InvalidMonth(s.to_string()))
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Month> for u8 {
    fn from(month: Month) -> Self {
        month.number()
    }
}

/// A single monthly CPI observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataPoint {
    /// Observation year
    pub year: i32,
    /// Observation month
    pub month: Month,
    /// Index value
    #[serde(rename = "cpi")]
    pub value: i64,
    /// Text of the first upstream footnote, empty when there is none
    pub notes: String,
}

impl DataPoint {
    /// Whether this observation is for the given year and month
    pub fn matches(&self, year: i32, month: Month) -> bool {
        self.year == year && self.month == month
    }
}

/// All parsed observations of one series, as fetched at a point in time
///
/// Never mutated after construction; a re-fetch produces a new snapshot.
#[derive(Debug, Clone)]
pub struct SeriesSnapshot {
    /// Series the observations belong to
    pub series_id: String,
    /// Observations in upstream order
    pub points: Vec<DataPoint>,
    /// When the series was fetched
    pub fetched_at: DateTime<Utc>,
}

impl SeriesSnapshot {
    /// Creates a snapshot stamped with the current time
    pub fn new(series_id: impl Into<String>, points: Vec<DataPoint>) -> Self {
        Self {
            series_id: series_id.into(),
            points,
            fetched_at: Utc::now(),
        }
    }

    /// Whether the snapshot is older than `ttl` at time `now`
    pub fn is_expired_at(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.fetched_at > ttl
    }

    /// Finds the observation for the given year and month, if present
    pub fn find(&self, year: i32, month: Month) -> Option<&DataPoint> {
        self.points.iter().find(|p| p.matches(year, month))
    }
}
