//! Knowledge-base question handler.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;

use super::super::AppState;
use super::helpers::{bad_request, error_response};
use crate::rag::RagError;

/// Answer a free-text biodiversity question from the knowledge corpus.
///
/// Accepts a multipart form with a single `question` field.
pub async fn ask_question(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut question: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return bad_request(format!("Invalid multipart body: {}", e)),
        };
        if field.name() == Some("question") {
            match field.text().await {
                Ok(value) => question = Some(value),
                Err(e) => return bad_request(format!("Failed to read question: {}", e)),
            }
        }
    }

    let question = match question {
        Some(q) if !q.trim().is_empty() => q,
        _ => return bad_request("Missing required field 'question'"),
    };

    match state.rag.ask(question.trim()).await {
        Ok(answer) => Json(answer).into_response(),
        Err(RagError::EmptyIndex) => error_response(
            StatusCode::CONFLICT,
            "Knowledge base has no indexed content yet",
        ),
        Err(RagError::Llm(e)) => {
            warn!(error = %e, "Question answering failed");
            error_response(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}
