//! Diesel-based observation repository for SQLite.
//!
//! Uses diesel-async's SyncConnectionWrapper to provide an async interface
//! while maintaining Diesel's compile-time query checking.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{NewObservationRecord, ObservationRecord};
use super::pool::{AsyncSqlitePool, DieselError};
use super::{parse_date, parse_datetime};
use crate::models::{Category, NewSighting, Observation};
use crate::schema::observations;

/// Convert a database record to a domain model.
impl From<ObservationRecord> for Observation {
    fn from(record: ObservationRecord) -> Self {
        Observation {
            id: record.id,
            species_name: record.species_name,
            common_name: record.common_name,
            observed_on: parse_date(&record.observed_on),
            latitude: record.latitude,
            longitude: record.longitude,
            location_description: record.location_description,
            notes: record.notes,
            image_path: record.image_path,
            category: Category::from_str(&record.category).unwrap_or(Category::Other),
            created_at: parse_datetime(&record.created_at),
        }
    }
}

/// Diesel-based observation repository with compile-time query checking.
#[derive(Clone)]
pub struct ObservationRepository {
    pool: AsyncSqlitePool,
}

impl ObservationRepository {
    /// Create a new observation repository with an existing pool.
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new observation and return the assigned row id.
    ///
    /// Duplicate submissions are stored as distinct rows; the table carries
    /// no uniqueness constraint beyond the generated identity.
    pub async fn insert(
        &self,
        sighting: &NewSighting,
        category: Category,
        image_path: Option<&str>,
    ) -> Result<i64, DieselError> {
        let mut conn = self.pool.get().await?;

        let observed_on = sighting.observed_on.format("%Y-%m-%d").to_string();
        let created_at = chrono::Utc::now().to_rfc3339();

        diesel::insert_into(observations::table)
            .values(&NewObservationRecord {
                species_name: &sighting.species_name,
                common_name: sighting.common_name.as_deref(),
                observed_on: &observed_on,
                latitude: sighting.latitude,
                longitude: sighting.longitude,
                location_description: sighting.location_description.as_deref(),
                notes: sighting.notes.as_deref(),
                image_path,
                category: category.as_str(),
                created_at: &created_at,
            })
            .execute(&mut conn)
            .await?;

        // Same connection, so this reads the id of the insert above.
        diesel::sql_query("SELECT last_insert_rowid()")
            .get_result::<LastInsertRowId>(&mut conn)
            .await
            .map(|r| r.id)
    }

    /// Get an observation by id.
    pub async fn get(&self, id: i64) -> Result<Option<Observation>, DieselError> {
        let mut conn = self.pool.get().await?;

        observations::table
            .find(id)
            .first::<ObservationRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Observation::from))
    }

    /// Get recent observations, newest observed date first.
    ///
    /// `category == None` returns observations across all categories. Rows
    /// sharing an observed date are ordered by descending id, keeping the
    /// ordering stable within a result set.
    pub async fn recent(
        &self,
        category: Option<Category>,
        limit: u32,
    ) -> Result<Vec<Observation>, DieselError> {
        let mut conn = self.pool.get().await?;

        let mut query = observations::table
            .order((observations::observed_on.desc(), observations::id.desc()))
            .limit(limit as i64)
            .into_boxed();

        if let Some(cat) = category {
            query = query.filter(observations::category.eq(cat.as_str()));
        }

        let records: Vec<ObservationRecord> = query.load(&mut conn).await?;
        Ok(records.into_iter().map(Observation::from).collect())
    }

    /// Count all observations.
    pub async fn count(&self) -> Result<u64, DieselError> {
        let mut conn = self.pool.get().await?;

        use diesel::dsl::count_star;
        let count: i64 = observations::table
            .select(count_star())
            .first(&mut conn)
            .await?;

        Ok(count as u64)
    }

    /// Delete every observation. Used only by cleanup.
    pub async fn delete_all(&self) -> Result<u64, DieselError> {
        let mut conn = self.pool.get().await?;

        let rows = diesel::delete(observations::table)
            .execute(&mut conn)
            .await?;

        Ok(rows as u64)
    }
}

#[derive(diesel::QueryableByName)]
struct LastInsertRowId {
    #[diesel(sql_type = diesel::sql_types::BigInt, column_name = "last_insert_rowid()")]
    id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::DbContext;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn sighting(species: &str, date: &str) -> NewSighting {
        NewSighting {
            species_name: species.to_string(),
            common_name: None,
            observed_on: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            latitude: 33.6844,
            longitude: 73.0479,
            location_description: None,
            notes: None,
        }
    }

    async fn setup() -> (ObservationRepository, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::from_sqlite_path(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        (ctx.observations(), dir)
    }

    #[tokio::test]
    async fn test_insert_returns_distinct_ids() {
        let (repo, _dir) = setup().await;

        let a = repo
            .insert(&sighting("Corvus splendens", "2024-05-01"), Category::Birds, None)
            .await
            .unwrap();
        let b = repo
            .insert(&sighting("Corvus splendens", "2024-05-01"), Category::Birds, None)
            .await
            .unwrap();

        // No deduplication: identical payloads become distinct rows.
        assert_ne!(a, b);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_recent_orders_and_filters() {
        let (repo, _dir) = setup().await;

        repo.insert(&sighting("Panthera pardus", "2024-04-20"), Category::Mammals, None)
            .await
            .unwrap();
        repo.insert(&sighting("Corvus splendens", "2024-05-01"), Category::Birds, None)
            .await
            .unwrap();
        repo.insert(&sighting("Psittacula krameri", "2024-05-03"), Category::Birds, None)
            .await
            .unwrap();

        let birds = repo.recent(Some(Category::Birds), 10).await.unwrap();
        assert_eq!(birds.len(), 2);
        assert!(birds.iter().all(|o| o.category == Category::Birds));
        assert_eq!(birds[0].species_name, "Psittacula krameri");
        assert_eq!(birds[1].species_name, "Corvus splendens");

        let all = repo.recent(None, 10).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].species_name, "Psittacula krameri");
    }

    #[tokio::test]
    async fn test_recent_respects_limit_and_tie_break() {
        let (repo, _dir) = setup().await;

        for i in 0..5 {
            repo.insert(
                &sighting(&format!("Species {i}"), "2024-05-01"),
                Category::Other,
                None,
            )
            .await
            .unwrap();
        }

        let rows = repo.recent(Some(Category::Other), 3).await.unwrap();
        assert_eq!(rows.len(), 3);
        // Same observed date: newest insertion first, stable.
        assert_eq!(rows[0].species_name, "Species 4");
        assert_eq!(rows[1].species_name, "Species 3");
        assert_eq!(rows[2].species_name, "Species 2");
    }

    #[tokio::test]
    async fn test_recent_unknown_category_is_empty() {
        let (repo, _dir) = setup().await;
        repo.insert(&sighting("Corvus splendens", "2024-05-01"), Category::Birds, None)
            .await
            .unwrap();

        let rows = repo.recent(Some(Category::Reptiles), 5).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_delete_all() {
        let (repo, _dir) = setup().await;
        repo.insert(&sighting("Corvus splendens", "2024-05-01"), Category::Birds, None)
            .await
            .unwrap();

        let removed = repo.delete_all().await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(repo.recent(None, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_round_trip_fields() {
        let (repo, _dir) = setup().await;

        let mut s = sighting("Corvus splendens", "2024-05-01");
        s.common_name = Some("House Crow".to_string());
        s.notes = Some("Seen near trail head".to_string());
        s.location_description = Some("Trail 5".to_string());

        let id = repo
            .insert(&s, Category::Birds, Some("images/birds_x.jpg"))
            .await
            .unwrap();

        let obs = repo.get(id).await.unwrap().unwrap();
        assert_eq!(obs.id, id);
        assert_eq!(obs.species_name, "Corvus splendens");
        assert_eq!(obs.common_name.as_deref(), Some("House Crow"));
        assert_eq!(obs.observed_on.to_string(), "2024-05-01");
        assert_eq!(obs.image_path.as_deref(), Some("images/birds_x.jpg"));
        assert_eq!(obs.category, Category::Birds);
    }
}
