use axum::Json;

use crate::models::HealthResponse;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "lectern-web",
        version: env!("CARGO_PKG_VERSION"),
    })
}
