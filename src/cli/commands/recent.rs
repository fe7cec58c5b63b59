//! Recent sightings command.

use console::style;

use super::super::helpers::build_context;
use crate::config::Settings;

/// List recent sightings, optionally filtered to one category.
pub async fn cmd_recent(
    settings: &Settings,
    category: Option<&str>,
    limit: u32,
) -> anyhow::Result<()> {
    let filter = match category {
        Some(label) => match settings.category_mode.parse(label) {
            Some(category) => Some(category),
            None => {
                anyhow::bail!(
                    "Unknown category '{}'. Expected one of: {}",
                    label,
                    settings.category_mode.labels()
                );
            }
        },
        None => None,
    };

    let ctx = build_context(settings).await?;
    let sightings = ctx.sightings.get_recent_sightings(filter, limit).await;

    if sightings.is_empty() {
        println!("No sightings recorded yet.");
        return Ok(());
    }

    for obs in &sightings {
        let common = obs
            .common_name
            .as_deref()
            .map(|n| format!(" ({})", n))
            .unwrap_or_default();
        println!(
            "{} {}{} [{}]",
            style(obs.observed_on).dim(),
            style(&obs.species_name).bold(),
            common,
            obs.category
        );
        if let Some(location) = &obs.location_description {
            println!("    {}", location);
        } else {
            println!("    ({}, {})", obs.latitude, obs.longitude);
        }
        if let Some(notes) = &obs.notes {
            println!("    {}", notes);
        }
    }

    Ok(())
}
