//! Business claim repository

use super::SqlFilter;
use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{BusinessClaim, CreateClaimInput, ListParams, ModerationStatus, PagedResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

#[async_trait]
pub trait ClaimRepository: Send + Sync {
    async fn create(&self, input: &CreateClaimInput) -> Result<BusinessClaim>;

    async fn get_by_id(&self, id: i64) -> Result<Option<BusinessClaim>>;

    async fn list(
        &self,
        status: Option<ModerationStatus>,
        query: Option<&str>,
        params: &ListParams,
    ) -> Result<PagedResult<BusinessClaim>>;
}

pub struct SqlxClaimRepository {
    pool: DynDatabasePool,
}

impl SqlxClaimRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ClaimRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ClaimRepository for SqlxClaimRepository {
    async fn create(&self, input: &CreateClaimInput) -> Result<BusinessClaim> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_claim_sqlite(self.pool.as_sqlite().unwrap(), input).await,
            DatabaseDriver::Mysql => create_claim_mysql(self.pool.as_mysql().unwrap(), input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<BusinessClaim>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_claim_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_claim_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list(
        &self,
        status: Option<ModerationStatus>,
        query: Option<&str>,
        params: &ListParams,
    ) -> Result<PagedResult<BusinessClaim>> {
        let filter = SqlFilter::new()
            .eq_opt("status", status.map(|s| s.as_str()))
            .search(&["message"], query);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_claims_sqlite(self.pool.as_sqlite().unwrap(), &filter, params).await
            }
            DatabaseDriver::Mysql => {
                list_claims_mysql(self.pool.as_mysql().unwrap(), &filter, params).await
            }
        }
    }
}

const CLAIM_COLUMNS: &str = "id, business_id, user_id, message, evidence, status, created_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_claim_sqlite(pool: &SqlitePool, input: &CreateClaimInput) -> Result<BusinessClaim> {
    let result = sqlx::query(
        "INSERT INTO business_claims (business_id, user_id, message, evidence, status, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(input.business_id)
    .bind(input.user_id)
    .bind(&input.message)
    .bind(&input.evidence)
    .bind(ModerationStatus::Pending.as_str())
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("Failed to create claim")?;

    get_claim_sqlite(pool, result.last_insert_rowid())
        .await?
        .context("Claim not found after creation")
}

async fn get_claim_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<BusinessClaim>> {
    let sql = format!("SELECT {} FROM business_claims WHERE id = ?", CLAIM_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get claim by ID")?;

    row.as_ref().map(row_to_claim_sqlite).transpose()
}

async fn list_claims_sqlite(
    pool: &SqlitePool,
    filter: &SqlFilter,
    params: &ListParams,
) -> Result<PagedResult<BusinessClaim>> {
    let sql = format!(
        "SELECT {} FROM business_claims{} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        CLAIM_COLUMNS,
        filter.where_sql()
    );
    let count_sql = format!("SELECT COUNT(*) FROM business_claims{}", filter.where_sql());
    let mut count = sqlx::query_scalar::<_, i64>(&count_sql);
    for value in filter.binds() {
        count = count.bind(value);
    }
    let total = count.fetch_one(pool).await.context("Failed to count claims")?;
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
        .context("Failed to list claims")?;

    let items = rows.iter().map(row_to_claim_sqlite).collect::<Result<Vec<_>>>()?;
    Ok(PagedResult::new(items, total, params))
}

fn row_to_claim_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<BusinessClaim> {
    let status: String = row.get("status");
    Ok(BusinessClaim {
        id: row.get("id"),
        business_id: row.get("business_id"),
        user_id: row.get("user_id"),
        message: row.get("message"),
        evidence: row.get("evidence"),
        status: ModerationStatus::from_str(&status)?,
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_claim_mysql(pool: &MySqlPool, input: &CreateClaimInput) -> Result<BusinessClaim> {
    let result = sqlx::query(
        "INSERT INTO business_claims (business_id, user_id, message, evidence, status, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(input.business_id)
    .bind(input.user_id)
    .bind(&input.message)
    .bind(&input.evidence)
    .bind(ModerationStatus::Pending.as_str())
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("Failed to create claim")?;

    get_claim_mysql(pool, result.last_insert_id() as i64)
        .await?
        .context("Claim not found after creation")
}

async fn get_claim_mysql(pool: &MySqlPool, id: i64) -> Result<Option<BusinessClaim>> {
    let sql = format!("SELECT {} FROM business_claims WHERE id = ?", CLAIM_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get claim by ID")?;

    row.as_ref().map(row_to_claim_mysql).transpose()
}

async fn list_claims_mysql(
    pool: &MySqlPool,
    filter: &SqlFilter,
    params: &ListParams,
) -> Result<PagedResult<BusinessClaim>> {
    let sql = format!(
        "SELECT {} FROM business_claims{} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        CLAIM_COLUMNS,
        filter.where_sql()
    );
    let count_sql = format!("SELECT COUNT(*) FROM business_claims{}", filter.where_sql());
    let mut count = sqlx::query_scalar::<_, i64>(&count_sql);
    for value in filter.binds() {
        count = count.bind(value);
    }
    let total = count.fetch_one(pool).await.context("Failed to count claims")?;
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
        .context("Failed to list claims")?;

    let items = rows.iter().map(row_to_claim_mysql).collect::<Result<Vec<_>>>()?;
    Ok(PagedResult::new(items, total, params))
}

fn row_to_claim_mysql(row: &sqlx::mysql::MySqlRow) -> Result<BusinessClaim> {
    let status: String = row.get("status");
    Ok(BusinessClaim {
        id: row.get("id"),
        business_id: row.get("business_id"),
        user_id: row.get("user_id"),
        message: row.get("message"),
        evidence: row.get("evidence"),
        status: ModerationStatus::from_str(&status)?,
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_business, insert_user, setup_pool};

    #[tokio::test]
    async fn test_claim_lifecycle_rows() {
        let pool = setup_pool().await;
        let user = insert_user(&pool, "heredera").await;
        let business = insert_business(&pool, "Panadería", None).await;
        let repo = SqlxClaimRepository::new(pool);

        let claim = repo
            .create(&CreateClaimInput {
                business_id: business,
                user_id: user,
                message: "Soy la dueña".into(),
                evidence: Some("/media/factura.pdf".into()),
            })
            .await
            .unwrap();
        assert_eq!(claim.status, ModerationStatus::Pending);
        assert_eq!(repo.get_by_id(claim.id).await.unwrap().unwrap().user_id, user);

        let listed = repo
            .list(Some(ModerationStatus::Pending), Some("dueña"), &ListParams::default())
            .await
            .unwrap();
        assert_eq!(listed.total, 1);
    }
}
