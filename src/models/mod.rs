//! Domain models for observations and species categories.

mod category;
mod observation;

pub use category::{Category, CategoryMode};
pub use observation::{NewSighting, Observation};
