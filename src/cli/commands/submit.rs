//! Sighting submission command.

use std::path::PathBuf;

use chrono::NaiveDate;
use console::style;

use super::super::helpers::build_context;
use crate::config::Settings;
use crate::models::NewSighting;
use crate::services::ImageUpload;

pub struct SubmitArgs {
    pub species_name: String,
    pub common_name: Option<String>,
    pub observed_on: NaiveDate,
    pub latitude: f64,
    pub longitude: f64,
    pub location_description: Option<String>,
    pub notes: Option<String>,
    pub image: Option<PathBuf>,
}

/// Submit a sighting from the command line.
pub async fn cmd_submit(settings: &Settings, args: SubmitArgs) -> anyhow::Result<()> {
    let image = match &args.image {
        Some(path) => {
            let bytes = std::fs::read(path).map_err(|e| {
                anyhow::anyhow!("Failed to read image '{}': {}", path.display(), e)
            })?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "upload".to_string());
            Some(ImageUpload { filename, bytes })
        }
        None => None,
    };

    let sighting = NewSighting {
        species_name: args.species_name,
        common_name: args.common_name,
        observed_on: args.observed_on,
        latitude: args.latitude,
        longitude: args.longitude,
        location_description: args.location_description,
        notes: args.notes,
    };

    let ctx = build_context(settings).await?;
    let report = ctx.sightings.save_sighting(sighting, image).await?;

    println!(
        "{} Saved observation #{} as {}",
        style("✓").green(),
        report.observation_id,
        style(report.category).bold()
    );
    if report.classifier_fallback {
        println!(
            "  {} Classifier unavailable or uncertain; filed under 'other'",
            style("!").yellow()
        );
    }
    if let Some(path) = &report.image_path {
        println!("  Image stored at {}", path);
    }
    if !report.knowledge_base_updated {
        println!(
            "  {} Knowledge base was not updated for this sighting",
            style("!").yellow()
        );
    }

    Ok(())
}
