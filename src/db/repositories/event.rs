//! Cultural event repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{CreateEventInput, CulturalEvent, ListParams, PagedResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, input: &CreateEventInput, published: bool) -> Result<CulturalEvent>;

    async fn get_by_id(&self, id: i64) -> Result<Option<CulturalEvent>>;

    /// Ordered by start time, soonest first
    async fn list(&self, published_only: bool, params: &ListParams)
        -> Result<PagedResult<CulturalEvent>>;

    /// Publish or hide; returns how many rows actually flipped. `by` is
    /// recorded when given, otherwise the previous publisher stays.
    async fn set_published(&self, ids: &[i64], published: bool, by: Option<i64>) -> Result<u64>;
}

pub struct SqlxEventRepository {
    pool: DynDatabasePool,
}

impl SqlxEventRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn EventRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl EventRepository for SqlxEventRepository {
    async fn create(&self, input: &CreateEventInput, published: bool) -> Result<CulturalEvent> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_event_sqlite(self.pool.as_sqlite().unwrap(), input, published).await
            }
            DatabaseDriver::Mysql => {
                create_event_mysql(self.pool.as_mysql().unwrap(), input, published).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<CulturalEvent>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_event_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_event_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list(
        &self,
        published_only: bool,
        params: &ListParams,
    ) -> Result<PagedResult<CulturalEvent>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_events_sqlite(self.pool.as_sqlite().unwrap(), published_only, params).await
            }
            DatabaseDriver::Mysql => {
                list_events_mysql(self.pool.as_mysql().unwrap(), published_only, params).await
            }
        }
    }

    async fn set_published(&self, ids: &[i64], published: bool, by: Option<i64>) -> Result<u64> {
        let sql = "UPDATE cultural_events SET published = ?, published_by = COALESCE(?, published_by) \
                   WHERE id = ? AND published <> ?";
        let mut affected = 0;
        for &id in ids {
            affected += match self.pool.driver() {
                DatabaseDriver::Sqlite => sqlx::query(sql)
                    .bind(published)
                    .bind(by)
                    .bind(id)
                    .bind(published)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to update event visibility")?
                    .rows_affected(),
                DatabaseDriver::Mysql => sqlx::query(sql)
                    .bind(published)
                    .bind(by)
                    .bind(id)
                    .bind(published)
                    .execute(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to update event visibility")?
                    .rows_affected(),
            };
        }
        Ok(affected)
    }
}

const EVENT_COLUMNS: &str =
    "id, name, description, starts_at, ends_at, location, published, published_by, created_at";

const INSERT_EVENT: &str = r#"
    INSERT INTO cultural_events
        (name, description, starts_at, ends_at, location, published, published_by, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
"#;

fn list_sql(published_only: bool) -> (String, String) {
    let filter = if published_only { " WHERE published = TRUE" } else { "" };
    (
        format!(
            "SELECT {} FROM cultural_events{} ORDER BY starts_at, id LIMIT ? OFFSET ?",
            EVENT_COLUMNS, filter
        ),
        format!("SELECT COUNT(*) FROM cultural_events{}", filter),
    )
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_event_sqlite(
    pool: &SqlitePool,
    input: &CreateEventInput,
    published: bool,
) -> Result<CulturalEvent> {
    let result = sqlx::query(INSERT_EVENT)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .bind(&input.location)
        .bind(published)
        .bind(input.published_by)
        .bind(Utc::now())
        .execute(pool)
        .await
        .context("Failed to create event")?;

    get_event_sqlite(pool, result.last_insert_rowid())
        .await?
        .context("Event not found after creation")
}

async fn get_event_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<CulturalEvent>> {
    let sql = format!("SELECT {} FROM cultural_events WHERE id = ?", EVENT_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get event by ID")?;

    Ok(row.as_ref().map(row_to_event_sqlite))
}

async fn list_events_sqlite(
    pool: &SqlitePool,
    published_only: bool,
    params: &ListParams,
) -> Result<PagedResult<CulturalEvent>> {
    let (sql, count_sql) = list_sql(published_only);
    let total: i64 = sqlx::query_scalar(&count_sql)
        .fetch_one(pool)
        .await
        .context("Failed to count events")?;
    let params = &params.clamp_to_total(total);

    let rows = sqlx::query(&sql)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list events")?;

    let events = rows.iter().map(row_to_event_sqlite).collect();
    Ok(PagedResult::new(events, total, params))
}

fn row_to_event_sqlite(row: &sqlx::sqlite::SqliteRow) -> CulturalEvent {
    CulturalEvent {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        starts_at: row.get("starts_at"),
        ends_at: row.get("ends_at"),
        location: row.get("location"),
        published: row.get("published"),
        published_by: row.get("published_by"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_event_mysql(
    pool: &MySqlPool,
    input: &CreateEventInput,
    published: bool,
) -> Result<CulturalEvent> {
    let result = sqlx::query(INSERT_EVENT)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .bind(&input.location)
        .bind(published)
        .bind(input.published_by)
        .bind(Utc::now())
        .execute(pool)
        .await
        .context("Failed to create event")?;

    get_event_mysql(pool, result.last_insert_id() as i64)
        .await?
        .context("Event not found after creation")
}

async fn get_event_mysql(pool: &MySqlPool, id: i64) -> Result<Option<CulturalEvent>> {
    let sql = format!("SELECT {} FROM cultural_events WHERE id = ?", EVENT_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get event by ID")?;

    Ok(row.as_ref().map(row_to_event_mysql))
}

async fn list_events_mysql(
    pool: &MySqlPool,
    published_only: bool,
    params: &ListParams,
) -> Result<PagedResult<CulturalEvent>> {
    let (sql, count_sql) = list_sql(published_only);
    let total: i64 = sqlx::query_scalar(&count_sql)
        .fetch_one(pool)
        .await
        .context("Failed to count events")?;
    let params = &params.clamp_to_total(total);

    let rows = sqlx::query(&sql)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list events")?;

    let events = rows.iter().map(row_to_event_mysql).collect();
    Ok(PagedResult::new(events, total, params))
}

fn row_to_event_mysql(row: &sqlx::mysql::MySqlRow) -> CulturalEvent {
    CulturalEvent {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        starts_at: row.get("starts_at"),
        ends_at: row.get("ends_at"),
        location: row.get("location"),
        published: row.get("published"),
        published_by: row.get("published_by"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::setup_pool;
    use chrono::Duration;

    fn event(name: &str, days_ahead: i64) -> CreateEventInput {
        let starts_at = Utc::now() + Duration::days(days_ahead);
        CreateEventInput {
            name: name.to_string(),
            description: "Fiesta patronal".into(),
            starts_at,
            ends_at: starts_at + Duration::hours(4),
            location: "Masaya".into(),
            published_by: None,
        }
    }

    #[tokio::test]
    async fn test_published_listing_ordered_by_start() {
        let repo = SqlxEventRepository::new(setup_pool().await);
        repo.create(&event("Torovenado", 10), true).await.unwrap();
        repo.create(&event("Güegüense", 2), true).await.unwrap();
        repo.create(&event("Propuesta", 1), false).await.unwrap();

        let page = repo.list(true, &ListParams::new(1, 5)).await.unwrap();
        let names: Vec<_> = page.items.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Güegüense", "Torovenado"]);
        assert_eq!(repo.list(false, &ListParams::new(1, 5)).await.unwrap().total, 3);
    }

    #[tokio::test]
    async fn test_set_published_counts_only_flips() {
        let repo = SqlxEventRepository::new(setup_pool().await);
        let hidden = repo.create(&event("Palo de mayo", 3), false).await.unwrap();
        let shown = repo.create(&event("Gritería", 5), true).await.unwrap();

        let flipped = repo
            .set_published(&[hidden.id, shown.id], true, None)
            .await
            .unwrap();
        assert_eq!(flipped, 1);
        assert!(repo.get_by_id(hidden.id).await.unwrap().unwrap().published);

        assert_eq!(repo.set_published(&[shown.id], false, None).await.unwrap(), 1);
        assert!(!repo.get_by_id(shown.id).await.unwrap().unwrap().published);
    }
}
