//! Topic and feed API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use scrollforge_core::{ContentItem, FeedError, TopicSummary};

use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateTopicRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub prompt_template: String,
}

#[derive(Debug, Serialize)]
pub struct CreateTopicResponse {
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct ItemsQueryParams {
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub load_more: bool,
}

#[derive(Debug, Deserialize)]
pub struct TrendingQueryParams {
    #[serde(default = "default_trending_limit")]
    pub limit: u32,
}

fn default_trending_limit() -> u32 {
    4
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            retry_after_secs: None,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/topics
///
/// Create a topic with a collision-free slug derived from the title.
pub async fn create_topic(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTopicRequest>,
) -> Result<impl IntoResponse, impl IntoResponse> {
    match state
        .paginator()
        .create_topic(&body.title, &body.prompt_template)
        .await
    {
        Ok(topic) => Ok((
            StatusCode::CREATED,
            Json(CreateTopicResponse { slug: topic.slug }),
        )),
        Err(FeedError::InvalidInput(msg)) => {
            Err((StatusCode::BAD_REQUEST, Json(ErrorResponse::new(msg))))
        }
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e.to_string())),
        )),
    }
}

/// GET /api/v1/topics/{slug}/items?offset&load_more
///
/// One page of the topic's feed, generating more content first when the
/// window would run short.
pub async fn get_items(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(params): Query<ItemsQueryParams>,
) -> Result<Json<Vec<ContentItem>>, impl IntoResponse> {
    match state
        .paginator()
        .page(&slug, params.offset, params.load_more)
        .await
    {
        Ok(items) => Ok(Json(items)),
        Err(FeedError::TopicNotFound(_)) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("Topic not found: {}", slug))),
        )),
        Err(FeedError::RateLimited { retry_after_secs }) => Err((
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse {
                error: "Rate limited".to_string(),
                retry_after_secs: Some(retry_after_secs),
            }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e.to_string())),
        )),
    }
}

/// GET /api/v1/topics/trending
///
/// Most recently created topics with preview content.
pub async fn trending(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TrendingQueryParams>,
) -> Result<Json<Vec<TopicSummary>>, impl IntoResponse> {
    match state.paginator().trending(params.limit).await {
        Ok(summaries) => Ok(Json(summaries)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e.to_string())),
        )),
    }
}
