//! Sighting ingestion orchestration.
//!
//! `save_sighting` sequences one logical unit of work per submitted
//! observation: classify -> write image -> insert row -> append knowledge
//! base -> trigger re-index. Steps are ordered so that a stored row never
//! references a missing image; the image write is undone when the insert
//! fails.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::knowledge::KnowledgeBase;
use crate::models::{Category, NewSighting, Observation};
use crate::repository::ObservationRepository;
use crate::services::classify::SpeciesClassifier;
use crate::storage::MediaStore;

/// An uploaded image: original filename plus raw bytes.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Outcome of a successful ingestion.
///
/// Degraded steps are reported rather than hidden: callers can distinguish
/// "classification fell back" and "knowledge base not updated" from a clean
/// run without treating either as a failure.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    /// Identity assigned by the record store.
    pub observation_id: i64,
    pub category: Category,
    /// True when classification degraded to the fallback label.
    pub classifier_fallback: bool,
    /// Relative path of the stored image, if one was uploaded.
    pub image_path: Option<String>,
    /// False when the corpus append failed (warning-level outcome).
    pub knowledge_base_updated: bool,
}

/// Outcome of a cleanup run.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    pub images_removed: u64,
    pub observations_removed: u64,
}

/// Hook for re-indexing the knowledge corpus after it grows.
#[async_trait]
pub trait KnowledgeIndexer: Send + Sync {
    async fn refresh_index(&self);
}

/// Orchestrates sighting ingestion across the classifier, media store,
/// record store and knowledge base.
pub struct SightingsService {
    repo: ObservationRepository,
    media: MediaStore,
    knowledge: Arc<KnowledgeBase>,
    classifier: SpeciesClassifier,
    indexer: Option<Arc<dyn KnowledgeIndexer>>,
}

impl SightingsService {
    pub fn new(
        repo: ObservationRepository,
        media: MediaStore,
        knowledge: Arc<KnowledgeBase>,
        classifier: SpeciesClassifier,
        indexer: Option<Arc<dyn KnowledgeIndexer>>,
    ) -> Self {
        Self {
            repo,
            media,
            knowledge,
            classifier,
            indexer,
        }
    }

    /// Ingest one sighting.
    ///
    /// Single pass, no retries. Classification always succeeds (fallback
    /// `other`). An image or database write failure aborts the operation;
    /// a knowledge-base append failure is reported but not fatal.
    pub async fn save_sighting(
        &self,
        sighting: NewSighting,
        image: Option<ImageUpload>,
    ) -> anyhow::Result<IngestReport> {
        let classification = self
            .classifier
            .classify(
                &sighting.species_name,
                sighting.common_name.as_deref().unwrap_or(""),
            )
            .await;
        let category = classification.category;

        let image_path = match &image {
            Some(upload) => Some(
                self.media
                    .save_image(category, &upload.filename, &upload.bytes)?,
            ),
            None => None,
        };

        let observation_id = match self
            .repo
            .insert(&sighting, category, image_path.as_deref())
            .await
        {
            Ok(id) => id,
            Err(e) => {
                // Undo the image write so no orphaned file is left behind.
                if let Some(path) = &image_path {
                    if let Err(undo_err) = self.media.remove(path) {
                        warn!(path = %path, error = %undo_err, "Failed to remove image after insert failure");
                    }
                }
                return Err(anyhow::anyhow!("Failed to insert observation: {}", e));
            }
        };

        let knowledge_base_updated =
            match self.knowledge.append_sighting(category, &sighting).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(
                        observation_id,
                        category = %category,
                        error = %e,
                        "Knowledge base append failed; observation stored without corpus entry"
                    );
                    false
                }
            };

        if knowledge_base_updated {
            if let Some(indexer) = &self.indexer {
                indexer.refresh_index().await;
            }
        }

        info!(
            observation_id,
            species = %sighting.species_name,
            category = %category,
            "Sighting saved"
        );

        Ok(IngestReport {
            observation_id,
            category,
            classifier_fallback: classification.fallback,
            image_path,
            knowledge_base_updated,
        })
    }

    /// Recent sightings read path.
    ///
    /// Absorbs storage errors into an empty result: an unknown category or
    /// a read failure is never surfaced as an error to the caller.
    pub async fn get_recent_sightings(
        &self,
        category: Option<Category>,
        limit: u32,
    ) -> Vec<Observation> {
        match self.repo.recent(category, limit).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "Failed to load recent sightings");
                Vec::new()
            }
        }
    }

    /// Delete all image files, then all observation rows.
    ///
    /// Not transactional across the two stores: a crash between the steps
    /// leaves one purged and the other intact. Corpus text is deliberately
    /// left in place.
    pub async fn cleanup(&self) -> anyhow::Result<CleanupReport> {
        let images_removed = self.media.clear()?;
        let observations_removed = self.repo.delete_all().await?;

        info!(images_removed, observations_removed, "Cleanup complete");
        Ok(CleanupReport {
            images_removed,
            observations_removed,
        })
    }
}
