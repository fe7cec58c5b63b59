//! Knowledge-base question command.

use console::style;

use super::super::helpers::build_context;
use crate::config::Settings;

/// Answer a free-text biodiversity question from the knowledge corpus.
pub async fn cmd_ask(settings: &Settings, question: &str) -> anyhow::Result<()> {
    let question = question.trim();
    if question.is_empty() {
        anyhow::bail!("No question given");
    }

    let ctx = build_context(settings).await?;

    println!("{} Indexing knowledge corpus...", style("→").cyan());
    let chunks = ctx.rag.reindex().await?;
    if chunks == 0 {
        anyhow::bail!("Knowledge corpus is empty; submit some sightings first");
    }

    println!("{} Thinking...", style("→").cyan());
    let answer = ctx.rag.ask(question).await?;

    println!();
    println!("{}", answer.answer);

    if !answer.sources.is_empty() {
        println!();
        println!("{}", style("Sources:").dim());
        for source in &answer.sources {
            println!("  {} {}", style("•").dim(), source.source);
        }
    }

    Ok(())
}
