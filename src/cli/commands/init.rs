//! Initialize command.

use console::style;

use crate::config::Settings;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    println!(
        "  {} Database ready at {}",
        style("✓").green(),
        settings.database_path().display()
    );
    println!(
        "  {} Sighting images in {}",
        style("✓").green(),
        settings.sightings_dir.display()
    );
    println!(
        "  {} Knowledge corpus in {}",
        style("✓").green(),
        settings.knowledge_dir.display()
    );
    println!(
        "{} Initialized BioScout in {}",
        style("✓").green(),
        settings.data_dir.display()
    );

    Ok(())
}
