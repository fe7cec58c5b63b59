//! Router configuration for the web server.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Observation submission and listing
        .route(
            "/observations",
            post(handlers::submit_observation).get(handlers::list_observations),
        )
        .route(
            "/recent-sightings/:category",
            get(handlers::recent_sightings),
        )
        // Species identification suggestions for a photo
        .route("/identify", post(handlers::identify_image))
        // Knowledge-base questions
        .route("/ask", post(handlers::ask_question))
        // Stored sighting images
        .route("/static/*path", get(handlers::serve_file))
        // Status/health API
        .route("/api/health", get(handlers::health))
        .route("/api/status", get(handlers::api_status))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
