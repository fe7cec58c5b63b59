//! BioScout - citizen-science biodiversity observation system.
//!
//! Records plant and animal sightings with photos, classifies them into
//! species categories via a local LLM, maintains a per-category knowledge
//! corpus, and answers biodiversity questions over that corpus.

mod cli;
mod config;
mod identify;
mod knowledge;
mod llm;
mod models;
mod rag;
mod repository;
mod schema;
mod server;
mod services;
mod storage;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "bioscout=info"
    } else {
        "bioscout=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Run CLI
    cli::run().await
}
