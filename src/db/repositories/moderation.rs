//! Moderation repository
//!
//! Status-only writes shared by every moderated table. A row moves only
//! while it is still `pending`, so repeated or overlapping admin actions
//! never flip an already decided record.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ModerationStatus, PostKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Which moderated collection an action targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationTarget {
    Post(PostKind),
    Suggestion,
    Claim,
}

impl ModerationTarget {
    pub fn table(&self) -> &'static str {
        match self {
            ModerationTarget::Post(_) => "posts",
            ModerationTarget::Suggestion => "business_suggestions",
            ModerationTarget::Claim => "business_claims",
        }
    }

    fn update_sql(&self) -> String {
        let kind_clause = match self {
            ModerationTarget::Post(_) => " AND kind = ?",
            _ => "",
        };
        format!(
            "UPDATE {} SET status = ? WHERE id = ? AND status = 'pending'{}",
            self.table(),
            kind_clause
        )
    }
}

#[async_trait]
pub trait ModerationRepository: Send + Sync {
    /// Move the pending rows among `ids` to `status`; returns rows changed
    async fn set_status(
        &self,
        target: ModerationTarget,
        ids: &[i64],
        status: ModerationStatus,
    ) -> Result<u64>;
}

pub struct SqlxModerationRepository {
    pool: DynDatabasePool,
}

impl SqlxModerationRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ModerationRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ModerationRepository for SqlxModerationRepository {
    async fn set_status(
        &self,
        target: ModerationTarget,
        ids: &[i64],
        status: ModerationStatus,
    ) -> Result<u64> {
        let sql = target.update_sql();
        let kind = match target {
            ModerationTarget::Post(kind) => Some(kind.as_str()),
            _ => None,
        };

        let mut affected = 0;
        for &id in ids {
            let result = match self.pool.driver() {
                DatabaseDriver::Sqlite => {
                    let mut query = sqlx::query(&sql).bind(status.as_str()).bind(id);
                    if let Some(kind) = kind {
                        query = query.bind(kind);
                    }
                    query
                        .execute(self.pool.as_sqlite().unwrap())
                        .await
                        .map(|r| r.rows_affected())
                }
                DatabaseDriver::Mysql => {
                    let mut query = sqlx::query(&sql).bind(status.as_str()).bind(id);
                    if let Some(kind) = kind {
                        query = query.bind(kind);
                    }
                    query
                        .execute(self.pool.as_mysql().unwrap())
                        .await
                        .map(|r| r.rows_affected())
                }
            };
            affected += result
                .with_context(|| format!("Failed to update status in {}", target.table()))?;
        }
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_user, setup_pool};
    use crate::db::repositories::{PostRepository, SqlxPostRepository};
    use crate::models::{CreatePostInput, Post};

    async fn pending_post(pool: &DynDatabasePool, kind: PostKind, author: i64) -> Post {
        SqlxPostRepository::new(pool.clone())
            .create(&CreatePostInput {
                kind,
                title: "Leyenda".into(),
                content: "Había una vez".into(),
                ingredients: None,
                image: None,
                author_id: author,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_only_pending_rows_change() {
        let pool = setup_pool().await;
        let author = insert_user(&pool, "narradora").await;
        let a = pending_post(&pool, PostKind::Story, author).await;
        let b = pending_post(&pool, PostKind::Story, author).await;
        let repo = SqlxModerationRepository::new(pool.clone());
        let target = ModerationTarget::Post(PostKind::Story);

        let changed = repo
            .set_status(target, &[a.id], ModerationStatus::Rejected)
            .await
            .unwrap();
        assert_eq!(changed, 1);

        let changed = repo
            .set_status(target, &[a.id, b.id, 999], ModerationStatus::Approved)
            .await
            .unwrap();
        assert_eq!(changed, 1);

        let posts = SqlxPostRepository::new(pool);
        let a = posts.get_by_id(a.id).await.unwrap().unwrap();
        let b = posts.get_by_id(b.id).await.unwrap().unwrap();
        assert_eq!(a.status, ModerationStatus::Rejected);
        assert_eq!(b.status, ModerationStatus::Approved);
        assert_eq!(b.title, "Leyenda");
    }

    #[tokio::test]
    async fn test_post_kind_must_match() {
        let pool = setup_pool().await;
        let author = insert_user(&pool, "cocinero").await;
        let recipe = pending_post(&pool, PostKind::Recipe, author).await;
        let repo = SqlxModerationRepository::new(pool);

        let changed = repo
            .set_status(
                ModerationTarget::Post(PostKind::Story),
                &[recipe.id],
                ModerationStatus::Approved,
            )
            .await
            .unwrap();
        assert_eq!(changed, 0);
    }

    #[test]
    fn test_update_sql_guards_pending() {
        assert_eq!(
            ModerationTarget::Claim.update_sql(),
            "UPDATE business_claims SET status = ? WHERE id = ? AND status = 'pending'"
        );
        assert!(ModerationTarget::Post(PostKind::Recipe)
            .update_sql()
            .ends_with("AND kind = ?"));
    }
}
