//! Topic suggestion API handler.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SuggestionsRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
}

/// POST /api/v1/suggestions
///
/// Suggest topics for a partial query. Infallible: degraded answers
/// instead of errors.
pub async fn suggest(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SuggestionsRequest>,
) -> Json<SuggestionsResponse> {
    let suggestions = state.suggestions().suggest(&body.query).await;
    Json(SuggestionsResponse { suggestions })
}
