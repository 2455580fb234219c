//! Common test utilities for E2E testing with mocks.
//!
//! Builds an in-process server over a temp-dir SQLite store with a mock
//! generator injected, so feed behavior is testable end-to-end without
//! external infrastructure.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use scrollforge_core::testing::MockLlmClient;
use scrollforge_core::{
    Config, FeedConfig, FeedPaginator, FeedStore, GenerationPipeline, LlmClient,
    LocalCoordinator, PipelineConfig, SqliteStore, SuggestionService,
};
use scrollforge_server::api::create_router;
use scrollforge_server::state::AppState;

/// Test fixture for E2E testing with a mock generator.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock generator - script responses and failures
    pub llm: Arc<MockLlmClient>,
    /// Temp dir holding the SQLite database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Configuration for the test fixture.
#[derive(Clone)]
pub struct TestConfig {
    pub feed: FeedConfig,
    /// `false` builds the fixture without a generator client at all
    /// (every batch is a fallback batch).
    pub with_generator: bool,
    /// Initial scripted response for the mock generator.
    pub response: String,
    /// Artificial generator latency.
    pub latency: Option<Duration>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            feed: FeedConfig {
                page_size: 5,
                batch_size: 5,
                min_initial_items: 5,
                rate_limit_per_minute: 100,
                busy_wait_secs: 0,
                ..Default::default()
            },
            with_generator: true,
            response: scrollforge_core::testing::fixtures::structured_response(5),
            latency: None,
        }
    }
}

impl TestConfig {
    /// Fixture without any generator client.
    pub fn without_generator() -> Self {
        Self {
            with_generator: false,
            ..Default::default()
        }
    }

    /// Fixture with a per-topic rate limit.
    pub fn with_rate_limit(limit: u32) -> Self {
        let mut config = Self::default();
        config.feed.rate_limit_per_minute = limit;
        config
    }
}

impl TestFixture {
    /// Create a new test fixture with default configuration.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let store: Arc<dyn FeedStore> =
            Arc::new(SqliteStore::new(&db_path).expect("Failed to create store"));

        let mut mock = MockLlmClient::with_response(test_config.response.clone());
        if let Some(latency) = test_config.latency {
            mock = mock.with_latency(latency);
        }
        let llm = Arc::new(mock);

        let llm_for_pipeline: Option<Arc<dyn LlmClient>> = if test_config.with_generator {
            Some(Arc::clone(&llm) as Arc<dyn LlmClient>)
        } else {
            None
        };

        let pipeline = Arc::new(GenerationPipeline::new(
            Arc::clone(&store),
            llm_for_pipeline.clone(),
            PipelineConfig::from_config(&test_config.feed, None),
        ));
        let coordinator = Arc::new(LocalCoordinator::new(
            test_config.feed.rate_limit_per_minute,
            Duration::from_secs(test_config.feed.generation_lock_timeout_secs),
        ));
        let paginator = Arc::new(FeedPaginator::new(
            Arc::clone(&store),
            pipeline,
            coordinator,
            test_config.feed.clone(),
        ));

        let config = Config {
            feed: test_config.feed,
            ..Default::default()
        };
        let suggestions = Arc::new(SuggestionService::new(
            llm_for_pipeline,
            config.suggestions.clone(),
        ));

        let state = Arc::new(AppState::new(config, paginator, suggestions));
        let router = create_router(state);

        Self {
            router,
            llm,
            temp_dir,
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

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Create a topic, returning its slug.
    pub async fn create_topic(&self, title: &str, prompt_template: &str) -> String {
        let response = self
            .post(
                "/api/v1/topics",
                serde_json::json!({"title": title, "prompt_template": prompt_template}),
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "topic creation failed: {}",
            response.body
        );
        response.body["slug"].as_str().unwrap().to_string()
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
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
