use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use crate::models::EngineInfoResponse;
use crate::state::AppState;

pub async fn engine_info(State(state): State<Arc<AppState>>) -> Json<EngineInfoResponse> {
    Json(EngineInfoResponse {
        info: state.engine.info(),
        corpus_path: state
            .corpus_path
            .as_ref()
            .map(|p| p.display().to_string()),
    })
}
