//! Status API handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::super::AppState;

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Overall system status.
pub async fn api_status(State(state): State<AppState>) -> impl IntoResponse {
    let observations = state.observations.count().await.unwrap_or(0);
    let indexed_chunks = state.rag.chunk_count().await;

    axum::Json(serde_json::json!({
        "observations": observations,
        "indexed_chunks": indexed_chunks,
        "categories": state.category_mode.labels(),
    }))
    .into_response()
}
