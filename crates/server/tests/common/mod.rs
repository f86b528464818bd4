//! Common test utilities for in-process API testing with mocks.
//!
//! This module provides a test fixture that builds the router with mock
//! search and email providers injected, so the HTTP surface can be tested
//! without any external service.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use scout_core::{
    load_config_from_str,
    testing::{MockEmailProvider, MockSearcher},
    EmailWaterfall, MemoryResolutionCache, Pipeline, TargetingPolicy,
};
use scout_server::state::AppState;

/// Re-export fixtures for test convenience
pub use scout_core::testing::fixtures;

/// Config used by every fixture: one directory override so domain
/// resolution never needs the search mock.
const TEST_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 8080

[[waterfall.directory]]
name = "Acme Partners"
domain = "acme.com"
"#;

/// Test fixture with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_band_lookup() {
///     let fixture = TestFixture::new();
///     let response = fixture.get("/api/v1/targeting/band?headcount=300").await;
///     assert_eq!(response.status, StatusCode::OK);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock search backend
    pub searcher: Arc<MockSearcher>,
    /// Mock primary email provider ("anymail")
    pub primary: Arc<MockEmailProvider>,
    /// Mock secondary email provider ("hunter", domain only)
    pub secondary: Arc<MockEmailProvider>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Create a fixture with every backend wired.
    pub fn new() -> Self {
        Self::with_config(TestConfig::default())
    }

    pub fn with_config(test_config: TestConfig) -> Self {
        let config = load_config_from_str(TEST_CONFIG).expect("Failed to parse test config");

        let searcher = Arc::new(MockSearcher::new());
        let primary = Arc::new(MockEmailProvider::new("anymail"));
        let secondary = Arc::new(MockEmailProvider::domain_only("hunter"));

        let mut waterfall = EmailWaterfall::new(
            Arc::new(MemoryResolutionCache::new(config.cache.clone())),
            config.waterfall.clone(),
        );
        if !test_config.without_providers {
            waterfall = waterfall
                .with_primary(primary.clone())
                .with_secondary(secondary.clone());
        }
        if !test_config.without_searcher {
            waterfall = waterfall.with_searcher(searcher.clone());
        }
        let waterfall = Arc::new(waterfall);

        let pipeline = (!test_config.without_searcher).then(|| {
            Arc::new(Pipeline::new(
                searcher.clone(),
                Arc::clone(&waterfall),
                TargetingPolicy::new(config.targeting.clone()),
                config.pipeline.clone(),
            ))
        });

        let state = Arc::new(AppState::new(
            config,
            "0123456789abcdef".to_string(),
            waterfall,
            pipeline,
        ));
        let router = scout_server::api::create_router(state);

        Self {
            router,
            searcher,
            primary,
            secondary,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

/// Which backends the fixture leaves out.
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    pub without_searcher: bool,
    pub without_providers: bool,
}

impl TestConfig {
    pub fn without_searcher() -> Self {
        Self {
            without_searcher: true,
            without_providers: false,
        }
    }

    pub fn without_providers() -> Self {
        Self {
            without_searcher: false,
            without_providers: true,
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
