//! Database context for connection management and repository access.
//!
//! Provides a unified entry point for database operations using Diesel ORM
//! over SQLite.

use std::path::Path;

use diesel_async::SimpleAsyncConnection;

use super::observation::ObservationRepository;
use super::pool::{AsyncSqlitePool, DieselError};

/// Database context that owns the connection factory and hands out
/// repositories.
///
/// Create one context per command or service, then use it to access
/// repositories.
#[derive(Clone)]
pub struct DbContext {
    pool: AsyncSqlitePool,
}

impl DbContext {
    /// Create a new database context from a file path.
    #[allow(dead_code)]
    pub fn from_sqlite_path(db_path: &Path) -> Self {
        Self {
            pool: AsyncSqlitePool::from_path(db_path),
        }
    }

    /// Create a new database context from a database URL
    /// (`sqlite:path/to/db.sqlite` or a bare file path).
    pub fn from_url(database_url: &str) -> Self {
        Self {
            pool: AsyncSqlitePool::new(database_url),
        }
    }

    /// Get the underlying connection pool.
    #[allow(dead_code)]
    pub fn pool(&self) -> &AsyncSqlitePool {
        &self.pool
    }

    /// Get an observation repository.
    pub fn observations(&self) -> ObservationRepository {
        ObservationRepository::new(self.pool.clone())
    }

    /// Initialize the database schema.
    ///
    /// Creates the necessary tables and indexes if they don't exist.
    pub async fn init_schema(&self) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;

        conn.batch_execute(
            r#"
            CREATE TABLE IF NOT EXISTS observations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                species_name TEXT NOT NULL,
                common_name TEXT,
                observed_on TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                location_description TEXT,
                notes TEXT,
                image_path TEXT,
                category TEXT NOT NULL DEFAULT 'other',
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_observations_category
                ON observations(category, observed_on DESC);
            "#,
        )
        .await?;

        Ok(())
    }
}
