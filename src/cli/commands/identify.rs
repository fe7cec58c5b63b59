//! Species identification command.

use std::path::Path;

use console::style;

use crate::config::Settings;
use crate::identify::IdentifyClient;

/// Score a photo against the vision API and print ranked suggestions.
pub async fn cmd_identify(
    settings: &Settings,
    image: &Path,
    lat: Option<f64>,
    lng: Option<f64>,
) -> anyhow::Result<()> {
    let bytes = std::fs::read(image)
        .map_err(|e| anyhow::anyhow!("Failed to read image '{}': {}", image.display(), e))?;
    let filename = image
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string());

    let client = IdentifyClient::new(settings.identify.clone())?;

    println!("{} Scoring image...", style("→").cyan());
    let suggestions = client.identify(&filename, bytes, lat, lng).await?;

    if suggestions.is_empty() {
        println!("No suggestions returned.");
        return Ok(());
    }

    for suggestion in &suggestions {
        println!(
            "  {} ({}) — {:.2}%",
            style(&suggestion.name).bold(),
            suggestion.rank,
            suggestion.confidence
        );
    }

    Ok(())
}
