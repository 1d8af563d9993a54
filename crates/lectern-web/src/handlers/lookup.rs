use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::models::{LookupRequest, LookupResponse};
use crate::state::AppState;

pub async fn lookup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LookupRequest>,
) -> impl IntoResponse {
    let citation = req.citation.trim();
    if citation.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "Citation is required",
                "candidates": [],
            })),
        )
            .into_response();
    }

    let result = state.engine.resolve_citation(citation).await;
    tracing::info!(
        citation,
        candidates = result.candidates.len(),
        "citation lookup"
    );

    Json(LookupResponse {
        success: true,
        result,
    })
    .into_response()
}
