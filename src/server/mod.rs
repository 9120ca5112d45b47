//! HTTP server for the CPI service
//!
//! Exposes the cache over a small REST API:
//!
//! - `GET /cpi/{series_id}/{year}/{month}` - CPI value for one month of a series
//! - `GET /health` - Health check with cached snapshot metadata

mod error;
pub mod handlers;

pub use error::{ApiError, NOT_FOUND_MESSAGE};

use std::future::Future;
use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use crate::cache::SeriesCache;
use crate::data::SeriesFetcher;

/// Shared application state
pub struct AppState<F> {
    pub cache: SeriesCache<F>,
}

impl<F: SeriesFetcher> AppState<F> {
    pub fn new(cache: SeriesCache<F>) -> Self {
        Self { cache }
    }
}

/// Build the router with all endpoints
pub fn build_router<F: SeriesFetcher + 'static>(state: Arc<AppState<F>>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::<F>))
        .route("/cpi/:series_id/:year/:month", get(handlers::get_cpi::<F>))
        .with_state(state)
}

/// Serves the API on `listener` until `shutdown` resolves
pub async fn serve<F, S>(
    listener: TcpListener,
    state: Arc<AppState<F>>,
    shutdown: S,
) -> std::io::Result<()>
where
    F: SeriesFetcher + 'static,
    S: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Starting HTTP server on {}", addr);
    }

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Graceful shutdown handler
pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
