//! Knowledge index rebuild command.

use console::style;

use super::super::helpers::build_context;
use crate::config::Settings;

/// Rebuild the in-memory knowledge index from the corpus files.
///
/// Mostly a connectivity check: the server rebuilds its own index at
/// startup and after each corpus append, but this verifies the corpus and
/// the embeddings service work together.
pub async fn cmd_reindex(settings: &Settings) -> anyhow::Result<()> {
    let ctx = build_context(settings).await?;

    println!("{} Rebuilding knowledge index...", style("→").cyan());
    let chunks = ctx.rag.reindex().await?;

    if chunks == 0 {
        println!(
            "{} Corpus is empty; nothing to index",
            style("!").yellow()
        );
    } else {
        println!("{} Indexed {} chunks", style("✓").green(), chunks);
    }

    Ok(())
}
