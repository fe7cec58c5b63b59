//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM with compile-time query checking,
//! running against SQLite through diesel-async's SyncConnectionWrapper.

pub mod context;
pub mod models;
pub mod observation;
pub mod pool;
pub mod util;

pub use context::DbContext;
pub use observation::ObservationRepository;
pub use pool::{AsyncSqlitePool, DieselError};

use chrono::{DateTime, NaiveDate, Utc};

/// Parse a timestamp string from the database, defaulting to Unix epoch on error.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Parse a calendar date string (`%Y-%m-%d`), defaulting to the epoch date on error.
pub fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or(NaiveDate::default())
}
