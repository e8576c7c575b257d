//! Comment report repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{CommentReport, ReportView};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn create(&self, comment_id: i64, user_id: i64, reason: &str) -> Result<CommentReport>;

    /// Reports joined with the comment and reporter, newest first
    async fn list(&self, unresolved_only: bool) -> Result<Vec<ReportView>>;

    /// Mark reports resolved; returns how many were still open
    async fn resolve(&self, ids: &[i64]) -> Result<u64>;
}

pub struct SqlxReportRepository {
    pool: DynDatabasePool,
}

impl SqlxReportRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ReportRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ReportRepository for SqlxReportRepository {
    async fn create(&self, comment_id: i64, user_id: i64, reason: &str) -> Result<CommentReport> {
        let now = Utc::now();
        let sql = "INSERT INTO comment_reports (comment_id, user_id, reason, resolved, created_at) \
                   VALUES (?, ?, ?, ?, ?)";
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(comment_id)
                .bind(user_id)
                .bind(reason)
                .bind(false)
                .bind(now)
                .execute(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to create report")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(comment_id)
                .bind(user_id)
                .bind(reason)
                .bind(false)
                .bind(now)
                .execute(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to create report")?
                .last_insert_id() as i64,
        };

        Ok(CommentReport {
            id,
            comment_id,
            user_id,
            reason: reason.to_string(),
            resolved: false,
            created_at: now,
        })
    }

    async fn list(&self, unresolved_only: bool) -> Result<Vec<ReportView>> {
        let sql = list_sql(unresolved_only);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .fetch_all(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to list reports")?;
                Ok(rows.iter().map(row_to_report_sqlite).collect())
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .fetch_all(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to list reports")?;
                Ok(rows.iter().map(row_to_report_mysql).collect())
            }
        }
    }

    async fn resolve(&self, ids: &[i64]) -> Result<u64> {
        let sql = "UPDATE comment_reports SET resolved = ? WHERE id = ? AND resolved = ?";
        let mut affected = 0;
        for &id in ids {
            affected += match self.pool.driver() {
                DatabaseDriver::Sqlite => sqlx::query(sql)
                    .bind(true)
                    .bind(id)
                    .bind(false)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to resolve report")?
                    .rows_affected(),
                DatabaseDriver::Mysql => sqlx::query(sql)
                    .bind(true)
                    .bind(id)
                    .bind(false)
                    .execute(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to resolve report")?
                    .rows_affected(),
            };
        }
        Ok(affected)
    }
}

fn list_sql(unresolved_only: bool) -> String {
    format!(
        r#"
        SELECT r.id, r.comment_id, c.business_id, c.text AS comment_text,
               u.username AS reporter, r.reason, r.resolved, r.created_at
        FROM comment_reports r
        JOIN comments c ON c.id = r.comment_id
        JOIN users u ON u.id = r.user_id
        {}
        ORDER BY r.created_at DESC, r.id DESC
        "#,
        if unresolved_only { "WHERE r.resolved = FALSE" } else { "" }
    )
}

fn row_to_report_sqlite(row: &sqlx::sqlite::SqliteRow) -> ReportView {
    ReportView {
        id: row.get("id"),
        comment_id: row.get("comment_id"),
        business_id: row.get("business_id"),
        comment_text: row.get("comment_text"),
        reporter: row.get("reporter"),
        reason: row.get("reason"),
        resolved: row.get("resolved"),
        created_at: row.get("created_at"),
    }
}

fn row_to_report_mysql(row: &sqlx::mysql::MySqlRow) -> ReportView {
    ReportView {
        id: row.get("id"),
        comment_id: row.get("comment_id"),
        business_id: row.get("business_id"),
        comment_text: row.get("comment_text"),
        reporter: row.get("reporter"),
        reason: row.get("reason"),
        resolved: row.get("resolved"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_business, insert_user, setup_pool};
    use crate::db::repositories::{ReviewRepository, SqlxReviewRepository};

    #[tokio::test]
    async fn test_report_resolve_flow() {
        let pool = setup_pool().await;
        let author = insert_user(&pool, "troll").await;
        let reporter = insert_user(&pool, "vigilante").await;
        let business = insert_business(&pool, "Cine", None).await;
        let comment = SqlxReviewRepository::new(pool.clone())
            .add_comment(business, author, "ofensivo")
            .await
            .unwrap();
        let repo = SqlxReportRepository::new(pool);

        let report = repo.create(comment.id, reporter, "insulto").await.unwrap();
        let open = repo.list(true).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].reporter, "vigilante");
        assert_eq!(open[0].comment_text, "ofensivo");
        assert_eq!(open[0].business_id, business);

        assert_eq!(repo.resolve(&[report.id]).await.unwrap(), 1);
        assert_eq!(repo.resolve(&[report.id]).await.unwrap(), 0);
        assert!(repo.list(true).await.unwrap().is_empty());
        assert!(repo.list(false).await.unwrap()[0].resolved);
    }
}
