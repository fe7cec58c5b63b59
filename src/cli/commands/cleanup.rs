//! Cleanup command.

use console::style;

use super::super::helpers::build_context;
use crate::config::Settings;

/// Delete all observations and stored images. Corpus text is kept.
pub async fn cmd_cleanup(settings: &Settings, confirm: bool) -> anyhow::Result<()> {
    if !confirm {
        println!(
            "{} This deletes every observation and stored image.",
            style("!").yellow()
        );
        println!("  Knowledge corpus files are kept.");
        println!("  Re-run with --confirm to proceed.");
        return Ok(());
    }

    let ctx = build_context(settings).await?;
    let report = ctx.sightings.cleanup().await?;

    println!(
        "{} Removed {} observations and {} images",
        style("✓").green(),
        report.observations_removed,
        report.images_removed
    );

    Ok(())
}
