//! E2E tests for topic creation, trending and suggestions.

mod common;

use axum::http::StatusCode;
use common::{TestConfig, TestFixture};

#[tokio::test]
async fn create_topic_returns_slug() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .post(
            "/api/v1/topics",
            serde_json::json!({"title": "GRE vocabulary", "prompt_template": "GRE words"}),
        )
        .await;

    assert_status!(response, StatusCode::CREATED);
    assert_eq!(response.body["slug"], "gre-vocabulary");
}

#[tokio::test]
async fn create_topic_requires_both_fields() {
    let fixture = TestFixture::new().await;

    let missing_prompt = fixture
        .post("/api/v1/topics", serde_json::json!({"title": "Facts"}))
        .await;
    assert_status!(missing_prompt, StatusCode::BAD_REQUEST);

    let blank_title = fixture
        .post(
            "/api/v1/topics",
            serde_json::json!({"title": "   ", "prompt_template": "facts"}),
        )
        .await;
    assert_status!(blank_title, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_topic_rejects_malformed_json() {
    let fixture = TestFixture::new().await;
    let response = fixture.post_raw("/api/v1/topics", "{ not json").await;
    assert!(response.status.is_client_error());
}

#[tokio::test]
async fn duplicate_titles_get_suffixed_slugs() {
    let fixture = TestFixture::new().await;

    let first = fixture.create_topic("Fun Facts", "history").await;
    let second = fixture.create_topic("Fun Facts", "science").await;
    let third = fixture.create_topic("Fun Facts", "math").await;

    assert_eq!(first, "fun-facts");
    assert_eq!(second, "fun-facts-1");
    assert_eq!(third, "fun-facts-2");
}

#[tokio::test]
async fn trending_lists_recent_topics_with_previews() {
    let fixture = TestFixture::new().await;
    let slug = fixture.create_topic("Facts", "facts").await;

    // Populate the first topic's feed
    let page = fixture
        .get(&format!("/api/v1/topics/{}/items", slug))
        .await;
    assert_status!(page, StatusCode::OK);
    fixture.create_topic("Empty one", "nothing yet").await;

    let response = fixture.get("/api/v1/topics/trending").await;
    assert_status!(response, StatusCode::OK);

    let summaries = response.body.as_array().unwrap();
    assert_eq!(summaries.len(), 2);

    let facts = summaries
        .iter()
        .find(|s| s["slug"] == "facts")
        .expect("topic missing from trending");
    assert!(facts["item_count"].as_u64().unwrap() >= 5);
    assert!(facts["preview_content"].is_string());

    let empty = summaries.iter().find(|s| s["slug"] == "empty-one").unwrap();
    assert_eq!(empty["item_count"], 0);
    assert!(empty.get("preview_content").is_none());
}

#[tokio::test]
async fn trending_respects_limit_param() {
    let fixture = TestFixture::new().await;
    for i in 0..6 {
        fixture.create_topic(&format!("Topic {}", i), "p").await;
    }

    let response = fixture.get("/api/v1/topics/trending?limit=3").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn suggestions_short_query_is_static() {
    let fixture = TestFixture::with_config(TestConfig::without_generator()).await;
    let response = fixture
        .post("/api/v1/suggestions", serde_json::json!({"query": ""}))
        .await;

    assert_status!(response, StatusCode::OK);
    let suggestions = response.body["suggestions"].as_array().unwrap();
    assert_eq!(suggestions.len(), 5);
    assert_eq!(suggestions[0], "World wonders");
}

#[tokio::test]
async fn suggestions_use_generator_for_long_queries() {
    let config = TestConfig {
        response: "Space facts, Mars trivia, Rocket history".to_string(),
        ..Default::default()
    };
    let fixture = TestFixture::with_config(config).await;

    let response = fixture
        .post("/api/v1/suggestions", serde_json::json!({"query": "space"}))
        .await;
    assert_status!(response, StatusCode::OK);

    let suggestions = response.body["suggestions"].as_array().unwrap();
    assert_eq!(suggestions[0], "Space facts");
    assert_eq!(suggestions.len(), 3);
}

#[tokio::test]
async fn suggestions_never_error_on_generator_failure() {
    let fixture = TestFixture::new().await;
    fixture.llm.set_next_error("provider outage").await;

    let response = fixture
        .post("/api/v1/suggestions", serde_json::json!({"query": "volcano"}))
        .await;
    assert_status!(response, StatusCode::OK);
    assert!(!response.body["suggestions"].as_array().unwrap().is_empty());
}
