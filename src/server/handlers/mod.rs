//! HTTP request handlers for the web server.

mod api;
mod ask;
mod files;
mod helpers;
mod identify;
mod observations;

// Re-export handlers for use by the router
pub use api::{api_status, health};
pub use ask::ask_question;
pub use files::serve_file;
pub use identify::identify_image;
pub use observations::{list_observations, recent_sightings, submit_observation};
