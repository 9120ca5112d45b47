//! Errors returned by the HTTP handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::data::{InvalidMonth, UpstreamError};

/// Message returned when a series has no observation for the requested month
pub const NOT_FOUND_MESSAGE: &str = "No CPI data available for the given month and year.";

/// Errors produced while answering a CPI query
#[derive(Debug, Error)]
pub enum ApiError {
    /// Year path segment is not an integer
    #[error("Invalid year: '{0}'")]
    InvalidYear(String),

    /// Month path segment is not a month name or number
    #[error(transparent)]
    InvalidMonth(#[from] InvalidMonth),

    /// The series has no observation for the requested year and month
    #[error("{}", NOT_FOUND_MESSAGE)]
    NotFound,

    /// Fetching the series from upstream failed
    #[error("Upstream data source unavailable: {0}")]
    Upstream(#[from] UpstreamError),
}

impl ApiError {
    /// HTTP status this error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidYear(_) | ApiError::InvalidMonth(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
