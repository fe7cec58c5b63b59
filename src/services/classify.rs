//! Species category classification via LLM.
//!
//! Maps a species' scientific and common name onto one label from the
//! configured closed category set. Classification never blocks ingestion:
//! a failed call or an out-of-set answer resolves to `other`.

use serde::Serialize;
use tracing::{debug, warn};

use crate::llm::LlmClient;
use crate::models::{Category, CategoryMode};

/// Prompt for category classification (uses {species}, {common} and
/// {labels} placeholders).
const CLASSIFY_PROMPT: &str = r#"As a biodiversity expert, classify the following species into one of these categories: {labels}.
Species Name: {species}
Common Name: {common}

Consider the following:
- Birds are feathered vertebrates that lay eggs
- Mammals are warm-blooded vertebrates that typically give birth to live young
- Plants are photosynthetic organisms that typically don't move
- Use 'other' for anything that fits none of the listed categories

Respond with ONLY ONE of these exact words: {labels}"#;

/// Classification sampling temperature. Near-deterministic on purpose.
const CLASSIFY_TEMPERATURE: f32 = 0.1;

/// Output token budget for the single-word answer.
const CLASSIFY_MAX_TOKENS: u32 = 100;

/// Outcome of a classification call.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Classification {
    pub category: Category,
    /// True when the external call failed or answered outside the label
    /// set and the category degraded to the fallback.
    pub fallback: bool,
}

/// Classifies species into categories using the LLM.
#[derive(Clone)]
pub struct SpeciesClassifier {
    llm: LlmClient,
    mode: CategoryMode,
}

impl SpeciesClassifier {
    pub fn new(llm: LlmClient, mode: CategoryMode) -> Self {
        Self { llm, mode }
    }

    /// Classify a species by name. Never errors; a single failed call
    /// resolves to the fallback label without retrying.
    pub async fn classify(&self, species_name: &str, common_name: &str) -> Classification {
        let prompt = render_prompt(self.mode, species_name, common_name);

        let response = match self
            .llm
            .generate_with(&prompt, CLASSIFY_TEMPERATURE, CLASSIFY_MAX_TOKENS)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(species = species_name, error = %e, "Classification failed, using fallback");
                return Classification {
                    category: Category::Other,
                    fallback: true,
                };
            }
        };

        match parse_label(self.mode, &response) {
            Some(category) => {
                debug!(species = species_name, category = %category, "Species classified");
                Classification {
                    category,
                    fallback: false,
                }
            }
            None => {
                warn!(
                    species = species_name,
                    answer = response.trim(),
                    "Classifier answered outside the label set, using fallback"
                );
                Classification {
                    category: Category::Other,
                    fallback: true,
                }
            }
        }
    }
}

fn render_prompt(mode: CategoryMode, species_name: &str, common_name: &str) -> String {
    CLASSIFY_PROMPT
        .replace("{labels}", &mode.labels())
        .replace("{species}", &species_name.to_lowercase())
        .replace("{common}", &common_name.to_lowercase())
}

/// Parse the model's answer into a category of the active mode.
fn parse_label(mode: CategoryMode, response: &str) -> Option<Category> {
    mode.parse(response.trim().to_lowercase().trim_matches(|c: char| !c.is_ascii_alphabetic()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmConfig;

    #[test]
    fn test_render_prompt_embeds_names_and_labels() {
        let prompt = render_prompt(CategoryMode::Extended, "Corvus Splendens", "House Crow");
        assert!(prompt.contains("corvus splendens"));
        assert!(prompt.contains("house crow"));
        assert!(prompt.contains("birds, mammals, plants, amphibians, reptiles, insects, other"));
    }

    #[test]
    fn test_parse_label_accepts_exact_labels() {
        assert_eq!(
            parse_label(CategoryMode::Extended, "birds"),
            Some(Category::Birds)
        );
        assert_eq!(
            parse_label(CategoryMode::Extended, "  Reptiles \n"),
            Some(Category::Reptiles)
        );
    }

    #[test]
    fn test_parse_label_rejects_prose() {
        assert_eq!(parse_label(CategoryMode::Extended, "It is a bird."), None);
        assert_eq!(parse_label(CategoryMode::Extended, "fungi"), None);
        assert_eq!(parse_label(CategoryMode::Extended, ""), None);
    }

    #[test]
    fn test_parse_label_respects_mode() {
        assert_eq!(parse_label(CategoryMode::Basic, "insects"), None);
        assert_eq!(
            parse_label(CategoryMode::Basic, "plants"),
            Some(Category::Plants)
        );
    }

    #[tokio::test]
    async fn test_disabled_llm_falls_back_to_other() {
        let llm = LlmClient::new(LlmConfig::disabled()).unwrap();
        let classifier = SpeciesClassifier::new(llm, CategoryMode::Extended);

        let result = classifier.classify("corvus splendens", "house crow").await;
        assert_eq!(result.category, Category::Other);
        assert!(result.fallback);
    }
}
