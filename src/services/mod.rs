//! Service layer for BioScout business logic.
//!
//! This module contains domain logic separated from interface concerns.
//! Services can be used by the CLI, the web server, or other interfaces.

pub mod classify;
pub mod ingest;

pub use classify::{Classification, SpeciesClassifier};
pub use ingest::{
    CleanupReport, ImageUpload, IngestReport, KnowledgeIndexer, SightingsService,
};
