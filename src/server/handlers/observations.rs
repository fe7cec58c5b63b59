//! Observation submission and listing handlers.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::warn;

use super::super::AppState;
use super::helpers::{bad_request, error_response};
use crate::models::NewSighting;
use crate::services::ImageUpload;

const DEFAULT_LIST_LIMIT: u32 = 100;
const DEFAULT_RECENT_LIMIT: u32 = 5;

/// Listing parameters.
#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<u32>,
}

#[derive(Default)]
struct SubmissionForm {
    species_name: Option<String>,
    common_name: Option<String>,
    observed_on: Option<String>,
    latitude: Option<String>,
    longitude: Option<String>,
    location_description: Option<String>,
    notes: Option<String>,
    image: Option<ImageUpload>,
}

impl SubmissionForm {
    /// Read all multipart fields. Unknown field names are ignored.
    async fn from_multipart(mut multipart: Multipart) -> Result<Self, String> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| format!("Invalid multipart body: {}", e))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" => {
                    let filename = field.file_name().unwrap_or("upload").to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| format!("Failed to read image field: {}", e))?;
                    if !bytes.is_empty() {
                        form.image = Some(ImageUpload {
                            filename,
                            bytes: bytes.to_vec(),
                        });
                    }
                }
                _ => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| format!("Failed to read field '{}': {}", name, e))?;
                    match name.as_str() {
                        "species_name" => form.species_name = Some(value),
                        "common_name" => form.common_name = Some(value),
                        "observed_on" | "date_observed" => form.observed_on = Some(value),
                        "latitude" | "lat" => form.latitude = Some(value),
                        "longitude" | "lng" => form.longitude = Some(value),
                        "location_description" => form.location_description = Some(value),
                        "notes" => form.notes = Some(value),
                        _ => {}
                    }
                }
            }
        }
        Ok(form)
    }

    fn into_sighting(self) -> Result<(NewSighting, Option<ImageUpload>), String> {
        let species_name = match self.species_name {
            Some(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => return Err("Missing required field 'species_name'".to_string()),
        };
        let observed_on = self
            .observed_on
            .ok_or_else(|| "Missing required field 'observed_on'".to_string())?;
        let observed_on = NaiveDate::parse_from_str(&observed_on, "%Y-%m-%d")
            .map_err(|_| format!("Invalid 'observed_on' date '{}', expected YYYY-MM-DD", observed_on))?;
        let latitude = parse_coord(self.latitude, "latitude")?;
        let longitude = parse_coord(self.longitude, "longitude")?;

        let sighting = NewSighting {
            species_name,
            common_name: non_empty(self.common_name),
            observed_on,
            latitude,
            longitude,
            location_description: non_empty(self.location_description),
            notes: non_empty(self.notes),
        };
        Ok((sighting, self.image))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

fn parse_coord(value: Option<String>, name: &str) -> Result<f64, String> {
    let raw = value.ok_or_else(|| format!("Missing required field '{}'", name))?;
    raw.trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid '{}' value '{}'", name, raw))
}

/// Submit a new observation (multipart form with optional image).
pub async fn submit_observation(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Response {
    let form = match SubmissionForm::from_multipart(multipart).await {
        Ok(form) => form,
        Err(msg) => return bad_request(msg),
    };
    let (sighting, image) = match form.into_sighting() {
        Ok(parsed) => parsed,
        Err(msg) => return bad_request(msg),
    };

    match state.sightings.save_sighting(sighting, image).await {
        Ok(report) => (StatusCode::CREATED, Json(report)).into_response(),
        Err(e) => {
            warn!(error = %e, "Observation submission failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// List observations, newest observed first.
pub async fn list_observations(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Response {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    match state.observations.recent(None, limit).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to list observations");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Recent sightings for one category.
pub async fn recent_sightings(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(params): Query<LimitParams>,
) -> Response {
    let Some(category) = state.category_mode.parse(&category) else {
        return bad_request(format!(
            "Invalid species category '{}', expected one of: {}",
            category,
            state.category_mode.labels()
        ));
    };

    let limit = params.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    let rows = state.sightings.get_recent_sightings(Some(category), limit).await;
    Json(rows).into_response()
}
