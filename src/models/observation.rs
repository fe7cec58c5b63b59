//! Observation model - one confirmed sighting.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Category;

/// A stored observation.
///
/// This struct is the single serialization contract for observations: every
/// read path (API responses, CLI output) goes through it rather than
/// re-deriving an ad-hoc field mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// Database row id, assigned on insert, immutable.
    pub id: i64,
    /// Scientific name.
    pub species_name: String,
    pub common_name: Option<String>,
    /// Calendar date of the sighting (local wall-clock, no timezone).
    pub observed_on: NaiveDate,
    pub latitude: f64,
    pub longitude: f64,
    pub location_description: Option<String>,
    pub notes: Option<String>,
    /// Relative path to the stored image, if one was uploaded.
    pub image_path: Option<String>,
    /// Assigned by the classifier, never user-supplied.
    pub category: Category,
    pub created_at: DateTime<Utc>,
}

/// Fields of a sighting as submitted by a user, before ingestion.
///
/// Category and identity are absent on purpose: the classifier assigns the
/// category and the record store assigns the id.
#[derive(Debug, Clone)]
pub struct NewSighting {
    pub species_name: String,
    pub common_name: Option<String>,
    pub observed_on: NaiveDate,
    pub latitude: f64,
    pub longitude: f64,
    pub location_description: Option<String>,
    pub notes: Option<String>,
}

impl NewSighting {
    /// Location line for human-readable output: the description if present,
    /// else the literal coordinate pair.
    pub fn location_line(&self) -> String {
        match self.location_description.as_deref() {
            Some(desc) if !desc.is_empty() => desc.to_string(),
            _ => format!("({}, {})", self.latitude, self.longitude),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sighting() -> NewSighting {
        NewSighting {
            species_name: "Corvus splendens".to_string(),
            common_name: Some("House Crow".to_string()),
            observed_on: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            latitude: 33.6844,
            longitude: 73.0479,
            location_description: None,
            notes: None,
        }
    }

    #[test]
    fn test_location_line_falls_back_to_coordinates() {
        assert_eq!(sighting().location_line(), "(33.6844, 73.0479)");
    }

    #[test]
    fn test_location_line_prefers_description() {
        let mut s = sighting();
        s.location_description = Some("Trail 5, Margalla Hills".to_string());
        assert_eq!(s.location_line(), "Trail 5, Margalla Hills");
    }

    #[test]
    fn test_empty_description_falls_back() {
        let mut s = sighting();
        s.location_description = Some(String::new());
        assert_eq!(s.location_line(), "(33.6844, 73.0479)");
    }
}
