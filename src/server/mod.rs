//! HTTP API for submitting and browsing sightings.
//!
//! Exposes the submission flow (multipart observation upload), recent
//! sightings queries, species identification suggestions, free-text
//! questions against the knowledge corpus, and stored image serving.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;
use crate::identify::IdentifyClient;
use crate::knowledge::KnowledgeBase;
use crate::llm::LlmClient;
use crate::models::CategoryMode;
use crate::rag::RagSystem;
use crate::repository::ObservationRepository;
use crate::services::{KnowledgeIndexer, SightingsService, SpeciesClassifier};
use crate::storage::MediaStore;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub sightings: Arc<SightingsService>,
    pub observations: Arc<ObservationRepository>,
    pub rag: Arc<RagSystem>,
    pub identify: Arc<IdentifyClient>,
    pub sightings_dir: PathBuf,
    pub category_mode: CategoryMode,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        let ctx = settings.create_db_context();

        let llm = LlmClient::new(settings.llm.clone())?;
        let identify = IdentifyClient::new(settings.identify.clone())?;

        let knowledge = Arc::new(KnowledgeBase::new(
            settings.knowledge_dir.clone(),
            &settings.corpus_prefix,
            settings.category_mode,
        ));
        let rag = Arc::new(RagSystem::new(llm.clone(), Arc::clone(&knowledge)));
        let classifier = SpeciesClassifier::new(llm, settings.category_mode);
        let media = MediaStore::new(settings.sightings_dir.clone());

        let sightings = Arc::new(SightingsService::new(
            ctx.observations(),
            media,
            knowledge,
            classifier,
            Some(Arc::clone(&rag) as Arc<dyn KnowledgeIndexer>),
        ));

        Ok(Self {
            sightings,
            observations: Arc::new(ctx.observations()),
            rag,
            identify: Arc::new(identify),
            sightings_dir: settings.sightings_dir.clone(),
            category_mode: settings.category_mode,
        })
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings).await?;

    // Build the retrieval index up front so questions work immediately.
    // Failures are logged and do not prevent startup.
    state.rag.refresh_index().await;

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tempfile::tempdir;
    use tower::ServiceExt;

    use crate::identify::IdentifyConfig;
    use crate::llm::LlmConfig;
    use crate::repository::DbContext;

    const BOUNDARY: &str = "test-boundary";

    async fn setup_test_app() -> (axum::Router, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let ctx = DbContext::from_sqlite_path(&db_path);
        ctx.init_schema().await.unwrap();

        let llm = LlmClient::new(LlmConfig::disabled()).unwrap();
        let identify = IdentifyClient::new(IdentifyConfig::disabled()).unwrap();
        let knowledge = Arc::new(KnowledgeBase::new(
            dir.path().join("knowledge"),
            "margalla",
            CategoryMode::Extended,
        ));
        let rag = Arc::new(RagSystem::new(llm.clone(), Arc::clone(&knowledge)));
        let classifier = SpeciesClassifier::new(llm, CategoryMode::Extended);
        let media = MediaStore::new(dir.path().join("sightings"));

        let sightings = Arc::new(SightingsService::new(
            ctx.observations(),
            media,
            knowledge,
            classifier,
            None,
        ));

        let state = AppState {
            sightings,
            observations: Arc::new(ctx.observations()),
            rag,
            identify: Arc::new(identify),
            sightings_dir: dir.path().join("sightings"),
            category_mode: CategoryMode::Extended,
        };

        (create_router(state), dir)
    }

    /// Build a multipart/form-data body from plain text fields.
    fn multipart_body(fields: &[(&str, &str)]) -> String {
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            ));
        }
        body.push_str(&format!("--{}--\r\n", BOUNDARY));
        body
    }

    fn multipart_request(uri: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _dir) = setup_test_app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_observations_empty() {
        let (app, _dir) = setup_test_app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/observations")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_submit_then_list() {
        let (app, _dir) = setup_test_app().await;

        let body = multipart_body(&[
            ("species_name", "Corvus splendens"),
            ("common_name", "House Crow"),
            ("observed_on", "2024-05-01"),
            ("latitude", "33.6844"),
            ("longitude", "73.0479"),
            ("notes", "Perched on a pine"),
        ]);
        let response = app
            .clone()
            .oneshot(multipart_request("/observations", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let report = body_json(response).await;
        assert!(report["observation_id"].as_i64().unwrap() > 0);
        // Disabled classifier falls back to the catch-all label.
        assert_eq!(report["category"], "other");
        assert_eq!(report["classifier_fallback"], true);
        assert_eq!(report["knowledge_base_updated"], true);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/observations")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(response).await;
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["species_name"], "Corvus splendens");
        assert_eq!(rows[0]["category"], "other");
    }

    #[tokio::test]
    async fn test_submit_missing_species_name() {
        let (app, _dir) = setup_test_app().await;

        let body = multipart_body(&[
            ("observed_on", "2024-05-01"),
            ("latitude", "33.6844"),
            ("longitude", "73.0479"),
        ]);
        let response = app
            .oneshot(multipart_request("/observations", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("species_name"));
    }

    #[tokio::test]
    async fn test_submit_bad_date() {
        let (app, _dir) = setup_test_app().await;

        let body = multipart_body(&[
            ("species_name", "Corvus splendens"),
            ("observed_on", "01/05/2024"),
            ("latitude", "33.6844"),
            ("longitude", "73.0479"),
        ]);
        let response = app
            .oneshot(multipart_request("/observations", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_recent_sightings_unknown_category() {
        let (app, _dir) = setup_test_app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/recent-sightings/dinosaurs")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_recent_sightings_valid_category_empty() {
        let (app, _dir) = setup_test_app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/recent-sightings/birds")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_ask_without_llm_is_bad_gateway() {
        let (app, _dir) = setup_test_app().await;

        let body = multipart_body(&[("question", "What birds live in Margalla Hills?")]);
        let response = app.oneshot(multipart_request("/ask", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_identify_disabled_returns_empty_list() {
        let (app, _dir) = setup_test_app().await;

        let mut body = String::new();
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"photo.jpg\"\r\nContent-Type: image/jpeg\r\n\r\nnot-a-real-jpeg\r\n",
            BOUNDARY
        ));
        body.push_str(&format!("--{}--\r\n", BOUNDARY));

        let response = app
            .oneshot(multipart_request("/identify", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_identify_missing_image() {
        let (app, _dir) = setup_test_app().await;

        let body = multipart_body(&[("lat", "33.6"), ("lng", "73.0")]);
        let response = app
            .oneshot(multipart_request("/identify", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_serve_file_traversal_rejected() {
        let (app, _dir) = setup_test_app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/static/..%2F..%2Fetc%2Fpasswd")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serve_stored_image() {
        let (app, dir) = setup_test_app().await;

        let images = dir.path().join("sightings").join("images");
        std::fs::create_dir_all(&images).unwrap();
        std::fs::write(images.join("birds_20240501_093015_crow.jpg"), b"jpeg-bytes").unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/static/images/birds_20240501_093015_crow.jpg")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/jpeg"
        );
    }
}
