//! Species identification via the iNaturalist computer-vision API.
//!
//! Sends an image (plus optional coordinates) to the scoring endpoint and
//! returns ranked species suggestions. This is a read-only helper for the
//! submission flow; it never writes anything.

use chrono::Local;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for the identification client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyConfig {
    /// Whether identification calls are enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Computer-vision scoring endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Optional bearer token
    #[serde(default)]
    pub api_token: Option<String>,
    /// Maximum number of suggestions to return
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

fn default_enabled() -> bool {
    true
}
fn default_endpoint() -> String {
    "https://api.inaturalist.org/v1/computervision/score_image".to_string()
}
fn default_max_suggestions() -> usize {
    10
}

impl Default for IdentifyConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            endpoint: default_endpoint(),
            api_token: None,
            max_suggestions: default_max_suggestions(),
        }
    }
}

impl IdentifyConfig {
    /// Disabled configuration for offline use and tests.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

/// One ranked species suggestion from the vision API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesSuggestion {
    /// Common name when the API has one, scientific name otherwise.
    pub name: String,
    /// Taxonomic rank ("species", "genus", ...).
    pub rank: String,
    /// Confidence score scaled to 0-100.
    pub confidence: f64,
}

/// Raw response shape of the scoring endpoint.
#[derive(Debug, Deserialize)]
struct ScoreResponse {
    #[serde(default)]
    results: Vec<ScoreResult>,
}

#[derive(Debug, Deserialize)]
struct ScoreResult {
    #[serde(default)]
    score: f64,
    taxon: Option<Taxon>,
}

#[derive(Debug, Deserialize)]
struct Taxon {
    name: Option<String>,
    preferred_common_name: Option<String>,
    rank: Option<String>,
}

impl ScoreResult {
    fn into_suggestion(self) -> SpeciesSuggestion {
        let taxon = self.taxon.unwrap_or(Taxon {
            name: None,
            preferred_common_name: None,
            rank: None,
        });
        let name = taxon
            .preferred_common_name
            .or(taxon.name)
            .unwrap_or_else(|| "Unknown".to_string());
        SpeciesSuggestion {
            name,
            rank: taxon.rank.unwrap_or_else(|| "unknown".to_string()),
            confidence: self.score * 100.0,
        }
    }
}

/// Identification error types.
#[derive(Debug)]
pub enum IdentifyError {
    /// Connection failed
    Connection(String),
    /// API returned an error
    Api(String),
    /// Failed to parse response
    Parse(String),
    /// Identification is disabled in config
    Disabled,
}

impl std::fmt::Display for IdentifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentifyError::Connection(e) => write!(f, "Identify connection error: {}", e),
            IdentifyError::Api(e) => write!(f, "Identify API error: {}", e),
            IdentifyError::Parse(e) => write!(f, "Identify parse error: {}", e),
            IdentifyError::Disabled => write!(f, "Identification is disabled"),
        }
    }
}

impl std::error::Error for IdentifyError {}

/// Client for the computer-vision scoring API.
#[derive(Clone)]
pub struct IdentifyClient {
    config: IdentifyConfig,
    client: Client,
}

impl IdentifyClient {
    pub fn new(config: IdentifyConfig) -> Result<Self, IdentifyError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| IdentifyError::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Score an image and return ranked suggestions.
    ///
    /// Coordinates are forwarded (together with today's date) when both are
    /// present; they narrow the candidate set by locality and season.
    pub async fn identify(
        &self,
        filename: &str,
        image: Vec<u8>,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Vec<SpeciesSuggestion>, IdentifyError> {
        if !self.config.enabled {
            return Err(IdentifyError::Disabled);
        }

        let part = Part::bytes(image)
            .file_name(filename.to_string())
            .mime_str(
                mime_guess::from_path(filename)
                    .first_or_octet_stream()
                    .as_ref(),
            )
            .map_err(|e| IdentifyError::Parse(e.to_string()))?;
        let form = Form::new().part("image", part);

        let mut request = self.client.post(&self.config.endpoint).multipart(form);

        if let (Some(lat), Some(lng)) = (latitude, longitude) {
            request = request.query(&[
                ("lat", lat.to_string()),
                ("lng", lng.to_string()),
                ("date", Local::now().date_naive().to_string()),
            ]);
        }
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }

        debug!(endpoint = %self.config.endpoint, filename, "Scoring image");

        let response = request
            .send()
            .await
            .map_err(|e| IdentifyError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IdentifyError::Api(format!(
                "HTTP {}",
                response.status().as_u16()
            )));
        }

        let scored: ScoreResponse = response
            .json()
            .await
            .map_err(|e| IdentifyError::Parse(e.to_string()))?;

        Ok(scored
            .results
            .into_iter()
            .take(self.config.max_suggestions)
            .map(ScoreResult::into_suggestion)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = IdentifyConfig::default();
        assert!(config.enabled);
        assert!(config.endpoint.contains("computervision/score_image"));
        assert!(config.api_token.is_none());
        assert_eq!(config.max_suggestions, 10);
    }

    #[tokio::test]
    async fn test_disabled_client_short_circuits() {
        let client = IdentifyClient::new(IdentifyConfig::disabled()).unwrap();
        let result = client
            .identify("photo.jpg", vec![1, 2, 3], None, None)
            .await;
        assert!(matches!(result, Err(IdentifyError::Disabled)));
    }

    #[test]
    fn test_suggestion_prefers_common_name() {
        let raw: ScoreResponse = serde_json::from_str(
            r#"{
                "results": [
                    {"score": 0.873, "taxon": {"name": "Corvus splendens",
                     "preferred_common_name": "House Crow", "rank": "species"}},
                    {"score": 0.041, "taxon": {"name": "Corvus", "rank": "genus"}}
                ]
            }"#,
        )
        .unwrap();

        let suggestions: Vec<_> = raw
            .results
            .into_iter()
            .map(ScoreResult::into_suggestion)
            .collect();

        assert_eq!(suggestions[0].name, "House Crow");
        assert_eq!(suggestions[0].rank, "species");
        assert!((suggestions[0].confidence - 87.3).abs() < 1e-9);
        assert_eq!(suggestions[1].name, "Corvus");
        assert_eq!(suggestions[1].rank, "genus");
    }

    #[test]
    fn test_suggestion_missing_taxon_is_unknown() {
        let raw: ScoreResponse = serde_json::from_str(r#"{"results": [{"score": 0.5}]}"#).unwrap();
        let s = raw.results.into_iter().next().unwrap().into_suggestion();
        assert_eq!(s.name, "Unknown");
        assert_eq!(s.rank, "unknown");
    }
}
