//! Diesel ORM row types for the observations table.

use diesel::prelude::*;

use crate::schema;

/// Observation record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::observations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ObservationRecord {
    pub id: i64,
    pub species_name: String,
    pub common_name: Option<String>,
    pub observed_on: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_description: Option<String>,
    pub notes: Option<String>,
    pub image_path: Option<String>,
    pub category: String,
    pub created_at: String,
}

/// New observation for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::observations)]
pub struct NewObservationRecord<'a> {
    pub species_name: &'a str,
    pub common_name: Option<&'a str>,
    pub observed_on: &'a str,
    pub latitude: f64,
    pub longitude: f64,
    pub location_description: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub image_path: Option<&'a str>,
    pub category: &'a str,
    pub created_at: &'a str,
}
