//! Shared wiring for CLI commands.

use std::sync::Arc;

use crate::config::Settings;
use crate::knowledge::KnowledgeBase;
use crate::llm::LlmClient;
use crate::rag::RagSystem;
use crate::repository::ObservationRepository;
use crate::services::{KnowledgeIndexer, SightingsService, SpeciesClassifier};
use crate::storage::MediaStore;

/// Everything a data-touching command needs, built from settings.
pub struct CommandContext {
    pub sightings: SightingsService,
    pub observations: ObservationRepository,
    pub rag: Arc<RagSystem>,
}

/// Build the service stack. Fails fast when the database was never
/// initialized so commands give a useful hint instead of an empty result.
pub async fn build_context(settings: &Settings) -> anyhow::Result<CommandContext> {
    if !settings.database_exists() {
        anyhow::bail!(
            "Database not found at {}. Run 'bioscout init' first.",
            settings.database_path().display()
        );
    }
    settings.ensure_directories()?;

    let ctx = settings.create_db_context();
    let llm = LlmClient::new(settings.llm.clone())?;

    let knowledge = Arc::new(KnowledgeBase::new(
        settings.knowledge_dir.clone(),
        &settings.corpus_prefix,
        settings.category_mode,
    ));
    let rag = Arc::new(RagSystem::new(llm.clone(), Arc::clone(&knowledge)));
    let classifier = SpeciesClassifier::new(llm, settings.category_mode);
    let media = MediaStore::new(settings.sightings_dir.clone());

    let sightings = SightingsService::new(
        ctx.observations(),
        media,
        knowledge,
        classifier,
        Some(Arc::clone(&rag) as Arc<dyn KnowledgeIndexer>),
    );

    Ok(CommandContext {
        sightings,
        observations: ctx.observations(),
        rag,
    })
}
