//! Species identification handler.

use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;

use super::super::AppState;
use super::helpers::bad_request;
use crate::identify::SpeciesSuggestion;

/// Score an uploaded photo against the vision API and return ranked
/// suggestions. Upstream failures are absorbed into an empty list; only a
/// malformed request is an error here.
pub async fn identify_image(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut image: Option<(String, Vec<u8>)> = None;
    let mut lat: Option<f64> = None;
    let mut lng: Option<f64> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return bad_request(format!("Invalid multipart body: {}", e)),
        };
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                match field.bytes().await {
                    Ok(bytes) if !bytes.is_empty() => image = Some((filename, bytes.to_vec())),
                    Ok(_) => {}
                    Err(e) => return bad_request(format!("Failed to read image: {}", e)),
                }
            }
            "lat" | "latitude" => {
                if let Ok(value) = field.text().await {
                    lat = value.trim().parse().ok();
                }
            }
            "lng" | "longitude" => {
                if let Ok(value) = field.text().await {
                    lng = value.trim().parse().ok();
                }
            }
            _ => {}
        }
    }

    let Some((filename, bytes)) = image else {
        return bad_request("Missing required field 'image'");
    };

    let suggestions: Vec<SpeciesSuggestion> =
        match state.identify.identify(&filename, bytes, lat, lng).await {
            Ok(suggestions) => suggestions,
            Err(e) => {
                warn!(error = %e, "Identification request failed");
                Vec::new()
            }
        };

    Json(suggestions).into_response()
}
