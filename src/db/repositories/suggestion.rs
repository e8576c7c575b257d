//! Business suggestion repository

use super::SqlFilter;
use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{
    BusinessSuggestion, CreateSuggestionInput, ListParams, ModerationStatus, PagedResult,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

#[async_trait]
pub trait SuggestionRepository: Send + Sync {
    async fn create(&self, input: &CreateSuggestionInput) -> Result<BusinessSuggestion>;

    async fn get_by_id(&self, id: i64) -> Result<Option<BusinessSuggestion>>;

    /// Newest first; `query` matches the suggested business name
    async fn list(
        &self,
        status: Option<ModerationStatus>,
        query: Option<&str>,
        params: &ListParams,
    ) -> Result<PagedResult<BusinessSuggestion>>;
}

pub struct SqlxSuggestionRepository {
    pool: DynDatabasePool,
}

impl SqlxSuggestionRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SuggestionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SuggestionRepository for SqlxSuggestionRepository {
    async fn create(&self, input: &CreateSuggestionInput) -> Result<BusinessSuggestion> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_suggestion_sqlite(self.pool.as_sqlite().unwrap(), input).await
            }
            DatabaseDriver::Mysql => {
                create_suggestion_mysql(self.pool.as_mysql().unwrap(), input).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<BusinessSuggestion>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_suggestion_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_suggestion_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list(
        &self,
        status: Option<ModerationStatus>,
        query: Option<&str>,
        params: &ListParams,
    ) -> Result<PagedResult<BusinessSuggestion>> {
        let filter = SqlFilter::new()
            .eq_opt("status", status.map(|s| s.as_str()))
            .search(&["business_name"], query);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_suggestions_sqlite(self.pool.as_sqlite().unwrap(), &filter, params).await
            }
            DatabaseDriver::Mysql => {
                list_suggestions_mysql(self.pool.as_mysql().unwrap(), &filter, params).await
            }
        }
    }
}

const SUGGESTION_COLUMNS: &str =
    "id, business_name, address, comments, category_id, photo, suggested_by, status, created_at";

const INSERT_SUGGESTION: &str = r#"
    INSERT INTO business_suggestions
        (business_name, address, comments, category_id, photo, suggested_by, status, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_suggestion_sqlite(
    pool: &SqlitePool,
    input: &CreateSuggestionInput,
) -> Result<BusinessSuggestion> {
    let result = sqlx::query(INSERT_SUGGESTION)
        .bind(&input.business_name)
        .bind(&input.address)
        .bind(&input.comments)
        .bind(input.category_id)
        .bind(&input.photo)
        .bind(input.suggested_by)
        .bind(ModerationStatus::Pending.as_str())
        .bind(Utc::now())
        .execute(pool)
        .await
        .context("Failed to create suggestion")?;

    get_suggestion_sqlite(pool, result.last_insert_rowid())
        .await?
        .context("Suggestion not found after creation")
}

async fn get_suggestion_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<BusinessSuggestion>> {
    let sql = format!("SELECT {} FROM business_suggestions WHERE id = ?", SUGGESTION_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get suggestion by ID")?;

    row.as_ref().map(row_to_suggestion_sqlite).transpose()
}

async fn list_suggestions_sqlite(
    pool: &SqlitePool,
    filter: &SqlFilter,
    params: &ListParams,
) -> Result<PagedResult<BusinessSuggestion>> {
    let sql = format!(
        "SELECT {} FROM business_suggestions{} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        SUGGESTION_COLUMNS,
        filter.where_sql()
    );
    let count_sql = format!("SELECT COUNT(*) FROM business_suggestions{}", filter.where_sql());
    let mut count = sqlx::query_scalar::<_, i64>(&count_sql);
    for value in filter.binds() {
        count = count.bind(value);
    }
    let total = count.fetch_one(pool).await.context("Failed to count suggestions")?;
    let params = &params.clamp_to_total(total);

    let mut query = sqlx::query(&sql);
    for value in filter.binds() {
        query = query.bind(value);
    }
    let rows = query
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list suggestions")?;

    let items = rows
        .iter()
        .map(row_to_suggestion_sqlite)
        .collect::<Result<Vec<_>>>()?;
    Ok(PagedResult::new(items, total, params))
}

fn row_to_suggestion_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<BusinessSuggestion> {
    let status: String = row.get("status");
    Ok(BusinessSuggestion {
        id: row.get("id"),
        business_name: row.get("business_name"),
        address: row.get("address"),
        comments: row.get("comments"),
        category_id: row.get("category_id"),
        photo: row.get("photo"),
        suggested_by: row.get("suggested_by"),
        status: ModerationStatus::from_str(&status)?,
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_suggestion_mysql(
    pool: &MySqlPool,
    input: &CreateSuggestionInput,
) -> Result<BusinessSuggestion> {
    let result = sqlx::query(INSERT_SUGGESTION)
        .bind(&input.business_name)
        .bind(&input.address)
        .bind(&input.comments)
        .bind(input.category_id)
        .bind(&input.photo)
        .bind(input.suggested_by)
        .bind(ModerationStatus::Pending.as_str())
        .bind(Utc::now())
        .execute(pool)
        .await
        .context("Failed to create suggestion")?;

    get_suggestion_mysql(pool, result.last_insert_id() as i64)
        .await?
        .context("Suggestion not found after creation")
}

async fn get_suggestion_mysql(pool: &MySqlPool, id: i64) -> Result<Option<BusinessSuggestion>> {
    let sql = format!("SELECT {} FROM business_suggestions WHERE id = ?", SUGGESTION_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get suggestion by ID")?;

    row.as_ref().map(row_to_suggestion_mysql).transpose()
}

async fn list_suggestions_mysql(
    pool: &MySqlPool,
    filter: &SqlFilter,
    params: &ListParams,
) -> Result<PagedResult<BusinessSuggestion>> {
    let sql = format!(
        "SELECT {} FROM business_suggestions{} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        SUGGESTION_COLUMNS,
        filter.where_sql()
    );
    let count_sql = format!("SELECT COUNT(*) FROM business_suggestions{}", filter.where_sql());
    let mut count = sqlx::query_scalar::<_, i64>(&count_sql);
    for value in filter.binds() {
        count = count.bind(value);
    }
    let total = count.fetch_one(pool).await.context("Failed to count suggestions")?;
    let params = &params.clamp_to_total(total);

    let mut query = sqlx::query(&sql);
    for value in filter.binds() {
        query = query.bind(value);
    }
    let rows = query
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list suggestions")?;

    let items = rows
        .iter()
        .map(row_to_suggestion_mysql)
        .collect::<Result<Vec<_>>>()?;
    Ok(PagedResult::new(items, total, params))
}

fn row_to_suggestion_mysql(row: &sqlx::mysql::MySqlRow) -> Result<BusinessSuggestion> {
    let status: String = row.get("status");
    Ok(BusinessSuggestion {
        id: row.get("id"),
        business_name: row.get("business_name"),
        address: row.get("address"),
        comments: row.get("comments"),
        category_id: row.get("category_id"),
        photo: row.get("photo"),
        suggested_by: row.get("suggested_by"),
        status: ModerationStatus::from_str(&status)?,
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_user, setup_pool};

    #[tokio::test]
    async fn test_create_and_search() {
        let pool = setup_pool().await;
        let user = insert_user(&pool, "vecino").await;
        let repo = SqlxSuggestionRepository::new(pool);

        for name in ["Fritanga Doña Tina", "Hotel Colonial"] {
            let created = repo
                .create(&CreateSuggestionInput {
                    business_name: name.into(),
                    address: "Masaya".into(),
                    comments: "muy bueno".into(),
                    category_id: None,
                    photo: None,
                    suggested_by: user,
                })
                .await
                .unwrap();
            assert_eq!(created.status, ModerationStatus::Pending);
        }

        let params = ListParams::new(1, 20);
        let pending = repo
            .list(Some(ModerationStatus::Pending), None, &params)
            .await
            .unwrap();
        assert_eq!(pending.total, 2);

        let hits = repo.list(None, Some("fritanga"), &params).await.unwrap();
        assert_eq!(hits.items.len(), 1);
        assert_eq!(hits.items[0].business_name, "Fritanga Doña Tina");
        assert!(repo
            .list(Some(ModerationStatus::Approved), None, &params)
            .await
            .unwrap()
            .items
            .is_empty());
    }
}
