//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific
//! modules.

mod ask;
mod cleanup;
mod identify;
mod init;
mod recent;
mod reindex;
mod serve;
mod submit;

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use crate::config::{Settings, SIGHTINGS_SUBDIR, KNOWLEDGE_SUBDIR};

#[derive(Parser)]
#[command(name = "bioscout")]
#[command(about = "Citizen-science biodiversity observation system")]
#[command(version)]
pub struct Cli {
    /// Data directory (overrides config file)
    #[arg(long, short = 't', global = true)]
    data_dir: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Start the web server
    Serve {
        /// Bind address: port, host, or host:port
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Submit a sighting
    Submit {
        /// Scientific species name
        species_name: String,
        /// Common name
        #[arg(long)]
        common_name: Option<String>,
        /// Observation date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// Free-text location description
        #[arg(long)]
        location: Option<String>,
        /// Observer notes
        #[arg(long)]
        notes: Option<String>,
        /// Photo to attach
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// List recent sightings
    Recent {
        /// Species category to filter by (all categories if omitted)
        category: Option<String>,
        /// Maximum number of sightings to show
        #[arg(short, long, default_value = "5")]
        limit: u32,
    },

    /// Suggest species identities for a photo
    Identify {
        /// Photo to score
        image: PathBuf,
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lng: Option<f64>,
    },

    /// Ask a question about local biodiversity
    Ask {
        /// The question to answer
        question: Vec<String>,
    },

    /// Rebuild the knowledge index from the corpus files
    Reindex,

    /// Delete all observations and stored images
    Cleanup {
        /// Skip the confirmation check
        #[arg(long)]
        confirm: bool,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        settings.sightings_dir = data_dir.join(SIGHTINGS_SUBDIR);
        settings.knowledge_dir = data_dir.join(KNOWLEDGE_SUBDIR);
        settings.data_dir = data_dir;
    }

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Serve { bind } => serve::cmd_serve(&settings, bind.as_deref()).await,
        Commands::Submit {
            species_name,
            common_name,
            date,
            lat,
            lng,
            location,
            notes,
            image,
        } => {
            let observed_on = date.unwrap_or_else(|| Local::now().date_naive());
            submit::cmd_submit(
                &settings,
                submit::SubmitArgs {
                    species_name,
                    common_name,
                    observed_on,
                    latitude: lat,
                    longitude: lng,
                    location_description: location,
                    notes,
                    image,
                },
            )
            .await
        }
        Commands::Recent { category, limit } => {
            recent::cmd_recent(&settings, category.as_deref(), limit).await
        }
        Commands::Identify { image, lat, lng } => {
            identify::cmd_identify(&settings, &image, lat, lng).await
        }
        Commands::Ask { question } => ask::cmd_ask(&settings, &question.join(" ")).await,
        Commands::Reindex => reindex::cmd_reindex(&settings).await,
        Commands::Cleanup { confirm } => cleanup::cmd_cleanup(&settings, confirm).await,
    }
}
