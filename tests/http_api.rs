//! Integration tests for the HTTP API
//!
//! Runs the router on an ephemeral port and queries it over real HTTP, with
//! either a stub fetcher or a mock upstream behind the cache.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde_json::json;
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cpi_service::cache::SeriesCache;
use cpi_service::data::{BlsClient, DataPoint, Month, SeriesFetcher, UpstreamError};
use cpi_service::server::{self, AppState, NOT_FOUND_MESSAGE};

const SERIES_ID: &str = "LAUCN040010000000005";

/// Fetcher returning canned data and counting calls
struct StubFetcher {
    points: Vec<DataPoint>,
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl StubFetcher {
    fn new(points: Vec<DataPoint>) -> Self {
        Self {
            points,
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    fn failing() -> Self {
        let fetcher = Self::new(Vec::new());
        fetcher.fail.store(true, Ordering::SeqCst);
        fetcher
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SeriesFetcher for StubFetcher {
    async fn fetch_all(&self, _series_id: &str) -> Result<Vec<DataPoint>, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(UpstreamError::MalformedResponse(
                "missing or empty 'series'".to_string(),
            ));
        }
        Ok(self.points.clone())
    }
}

fn may_june_2020() -> Vec<DataPoint> {
    vec![
        DataPoint {
            year: 2020,
            month: Month::May,
            value: 250,
            notes: "Test Note May".to_string(),
        },
        DataPoint {
            year: 2020,
            month: Month::June,
            value: 260,
            notes: "Test Note June".to_string(),
        },
    ]
}

/// Starts the server in the background, returning its base URL
async fn spawn_app<F: SeriesFetcher + 'static>(fetcher: F) -> String {
    let state = Arc::new(AppState::new(SeriesCache::new(fetcher)));
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener should have an address");

    tokio::spawn(server::serve(
        listener,
        state,
        std::future::pending::<()>(),
    ));

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_get_cpi_returns_data_point() {
    let fetcher = Arc::new(StubFetcher::new(may_june_2020()));
    let base = spawn_app(Arc::clone(&fetcher)).await;

    let response = reqwest::get(format!("{}/cpi/{}/2020/May", base, SERIES_ID))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({"year": 2020, "month": 5, "cpi": 250, "notes": "Test Note May"})
    );
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn test_get_cpi_accepts_month_number_and_any_case() {
    let fetcher = Arc::new(StubFetcher::new(may_june_2020()));
    let base = spawn_app(Arc::clone(&fetcher)).await;

    for month in ["6", "june", "JUNE", "June"] {
        let response = reqwest::get(format!("{}/cpi/{}/2020/{}", base, SERIES_ID, month))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "month segment {}", month);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["cpi"], 260);
    }

    // All four requests were answered from one fetch
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn test_get_cpi_missing_month_is_404() {
    let fetcher = Arc::new(StubFetcher::new(may_june_2020()));
    let base = spawn_app(Arc::clone(&fetcher)).await;

    let response = reqwest::get(format!("{}/cpi/{}/2019/January", base, SERIES_ID))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.text().await.unwrap(), NOT_FOUND_MESSAGE);
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn test_get_cpi_bad_path_is_400_without_fetching() {
    let fetcher = Arc::new(StubFetcher::new(may_june_2020()));
    let base = spawn_app(Arc::clone(&fetcher)).await;

    let bad_month = reqwest::get(format!("{}/cpi/{}/2020/Smarch", base, SERIES_ID))
        .await
        .unwrap();
    assert_eq!(bad_month.status(), StatusCode::BAD_REQUEST);
    assert!(bad_month.text().await.unwrap().contains("Smarch"));

    let bad_year = reqwest::get(format!("{}/cpi/{}/twenty/May", base, SERIES_ID))
        .await
        .unwrap();
    assert_eq!(bad_year.status(), StatusCode::BAD_REQUEST);
    assert!(bad_year.text().await.unwrap().contains("twenty"));

    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_get_cpi_upstream_failure_is_502() {
    let base = spawn_app(StubFetcher::failing()).await;

    let response = reqwest::get(format!("{}/cpi/{}/2020/May", base, SERIES_ID))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(response.text().await.unwrap().contains("Malformed upstream response"));
}

#[tokio::test]
async fn test_health_reports_cached_snapshot() {
    let base = spawn_app(StubFetcher::new(may_june_2020())).await;

    let body: serde_json::Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["cache_ttl_secs"], 86_400);
    assert!(body["cache"].is_null());

    reqwest::get(format!("{}/cpi/{}/2020/May", base, SERIES_ID))
        .await
        .unwrap();

    let body: serde_json::Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["cache"]["series_id"], SERIES_ID);
    assert_eq!(body["cache"]["points"], 2);
    assert_eq!(body["cache"]["is_expired"], false);
}

#[tokio::test]
async fn test_end_to_end_with_mock_upstream() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/timeseries/data/{}", SERIES_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Results": {
                "series": [{
                    "seriesID": SERIES_ID,
                    "data": [
                        {"year": "2020", "periodName": "June", "value": "260",
                         "footnotes": [{"text": "Test Note June"}]},
                        {"year": "2020", "periodName": "May", "value": "250", "footnotes": [{}]},
                        {"year": "2020", "periodName": "Annual", "value": "255"}
                    ]
                }]
            }
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let base_url = Url::parse(&format!("{}/timeseries/data/", upstream.uri()))
        .expect("Mock upstream URL should parse");
    let client = BlsClient::with_base_url(base_url);
    let base = spawn_app(client).await;

    let june: serde_json::Value = reqwest::get(format!("{}/cpi/{}/2020/6", base, SERIES_ID))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        june,
        json!({"year": 2020, "month": 6, "cpi": 260, "notes": "Test Note June"})
    );

    let may: serde_json::Value = reqwest::get(format!("{}/cpi/{}/2020/May", base, SERIES_ID))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(may["notes"], "");

    // MockServer verifies the single upstream call on drop
}
