//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that builds the addon router in-process
//! with mock upstreams injected, so the HTTP surface can be exercised without
//! TMDB, indexers or AllDebrid.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use relaystream_core::{
    load_config_from_str,
    media::MediaKind,
    testing::{MockDebridClient, MockIndexer, MockMetadataProvider},
    Caches, Config, DebridClient, Indexer, IndexerSet, MetadataProvider, StreamOrchestrator,
};
use relaystream_server::state::AppState;

/// Re-export fixtures for test convenience
pub use relaystream_core::testing::fixtures;

const TEST_CONFIG: &str = r#"
[tmdb]
api_key = "test-tmdb-key"

[alldebrid]
api_key = "test-alldebrid-key"

[pipeline]
upstream_timeout_secs = 1

[defaults]
resolutions = ["1080p"]
languages = ["MULTI"]
codecs = ["x265"]
output_cap = 5
"#;

/// Test fixture for E2E testing with mock dependencies.
///
/// The metadata mock knows `tt1` (movie "Film") and `tt2` (series "Show").
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    pub metadata: Arc<MockMetadataProvider>,
    /// Mock indexer named `ygg`
    pub indexer: Arc<MockIndexer>,
    pub debrid: Arc<MockDebridClient>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    pub async fn new() -> Self {
        let config: Config = load_config_from_str(TEST_CONFIG).expect("Invalid test config");

        let metadata = Arc::new(MockMetadataProvider::new());
        metadata
            .add(fixtures::metadata("tt1", MediaKind::Movie, "Film", None))
            .await;
        metadata
            .add(fixtures::metadata("tt2", MediaKind::Series, "Show", None))
            .await;
        let indexer = Arc::new(MockIndexer::new("ygg"));
        let debrid = Arc::new(MockDebridClient::new());

        let orchestrator = StreamOrchestrator::new(
            Arc::clone(&metadata) as Arc<dyn MetadataProvider>,
            IndexerSet::new(
                vec![Arc::clone(&indexer) as Arc<dyn Indexer>],
                Duration::from_secs(1),
            ),
            Arc::clone(&debrid) as Arc<dyn DebridClient>,
            Caches::in_memory(),
            config.pipeline.clone(),
        );

        let state = Arc::new(AppState::new(config, Arc::new(orchestrator)));
        let router = relaystream_server::api::create_router(state);

        Self {
            router,
            metadata,
            indexer,
            debrid,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

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

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

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

        (status, String::from_utf8_lossy(&body_bytes).into_owned())
    }
}

/// Addon config segment for the given JSON (URL-safe so it stays one path segment).
pub fn encode_config(json: &Value) -> String {
    URL_SAFE_NO_PAD.encode(json.to_string())
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
