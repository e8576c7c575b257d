//! Comment and rating repository
//!
//! A rating may point at the comment it was written with (`comment_id`,
//! unique); detail pages list comments together with that linked score.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Comment, CommentWithScore, Rating};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn add_comment(&self, business_id: i64, user_id: i64, text: &str) -> Result<Comment>;

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>>;

    async fn delete_comment(&self, id: i64) -> Result<bool>;

    async fn add_rating(
        &self,
        business_id: i64,
        user_id: i64,
        comment_id: Option<i64>,
        score: i32,
    ) -> Result<Rating>;

    /// Ratings of a business, newest first
    async fn ratings_for(&self, business_id: i64) -> Result<Vec<Rating>>;

    /// Comments of a business, newest first, each with its linked score
    async fn comments_with_score(&self, business_id: i64) -> Result<Vec<CommentWithScore>>;

    /// Most recent rating `user_id` gave the business
    async fn latest_rating_by(&self, business_id: i64, user_id: i64) -> Result<Option<Rating>>;
}

pub struct SqlxReviewRepository {
    pool: DynDatabasePool,
}

impl SqlxReviewRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ReviewRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ReviewRepository for SqlxReviewRepository {
    async fn add_comment(&self, business_id: i64, user_id: i64, text: &str) -> Result<Comment> {
        let now = Utc::now();
        let sql = "INSERT INTO comments (business_id, user_id, text, created_at) VALUES (?, ?, ?, ?)";
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(business_id)
                .bind(user_id)
                .bind(text)
                .bind(now)
                .execute(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to create comment")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(business_id)
                .bind(user_id)
                .bind(text)
                .bind(now)
                .execute(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to create comment")?
                .last_insert_id() as i64,
        };

        Ok(Comment {
            id,
            business_id,
            user_id,
            text: text.to_string(),
            created_at: now,
        })
    }

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_comment_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_comment_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn delete_comment(&self, id: i64) -> Result<bool> {
        let sql = "DELETE FROM comments WHERE id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(id)
                .execute(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to delete comment")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(id)
                .execute(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to delete comment")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn add_rating(
        &self,
        business_id: i64,
        user_id: i64,
        comment_id: Option<i64>,
        score: i32,
    ) -> Result<Rating> {
        let now = Utc::now();
        let sql = "INSERT INTO ratings (business_id, user_id, comment_id, score, created_at) \
                   VALUES (?, ?, ?, ?, ?)";
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(business_id)
                .bind(user_id)
                .bind(comment_id)
                .bind(score)
                .bind(now)
                .execute(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to create rating")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(business_id)
                .bind(user_id)
                .bind(comment_id)
                .bind(score)
                .bind(now)
                .execute(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to create rating")?
                .last_insert_id() as i64,
        };

        Ok(Rating {
            id,
            business_id,
            user_id,
            comment_id,
            score,
            created_at: now,
        })
    }

    async fn ratings_for(&self, business_id: i64) -> Result<Vec<Rating>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_ratings_sqlite(self.pool.as_sqlite().unwrap(), business_id, None).await
            }
            DatabaseDriver::Mysql => {
                list_ratings_mysql(self.pool.as_mysql().unwrap(), business_id, None).await
            }
        }
    }

    async fn comments_with_score(&self, business_id: i64) -> Result<Vec<CommentWithScore>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                comments_with_score_sqlite(self.pool.as_sqlite().unwrap(), business_id).await
            }
            DatabaseDriver::Mysql => {
                comments_with_score_mysql(self.pool.as_mysql().unwrap(), business_id).await
            }
        }
    }

    async fn latest_rating_by(&self, business_id: i64, user_id: i64) -> Result<Option<Rating>> {
        let ratings = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_ratings_sqlite(self.pool.as_sqlite().unwrap(), business_id, Some(user_id))
                    .await?
            }
            DatabaseDriver::Mysql => {
                list_ratings_mysql(self.pool.as_mysql().unwrap(), business_id, Some(user_id))
                    .await?
            }
        };
        Ok(ratings.into_iter().next())
    }
}

const RATING_COLUMNS: &str = "id, business_id, user_id, comment_id, score, created_at";

const COMMENTS_WITH_SCORE: &str = r#"
    SELECT c.id, c.user_id, u.username, c.text, r.score, c.created_at
    FROM comments c
    JOIN users u ON u.id = c.user_id
    LEFT JOIN ratings r ON r.comment_id = c.id
    WHERE c.business_id = ?
    ORDER BY c.created_at DESC, c.id DESC
"#;

fn ratings_sql(by_user: bool) -> String {
    format!(
        "SELECT {} FROM ratings WHERE business_id = ?{} ORDER BY created_at DESC, id DESC",
        RATING_COLUMNS,
        if by_user { " AND user_id = ?" } else { "" }
    )
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn get_comment_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query("SELECT id, business_id, user_id, text, created_at FROM comments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get comment by ID")?;

    Ok(row.map(|row| Comment {
        id: row.get("id"),
        business_id: row.get("business_id"),
        user_id: row.get("user_id"),
        text: row.get("text"),
        created_at: row.get("created_at"),
    }))
}

async fn list_ratings_sqlite(
    pool: &SqlitePool,
    business_id: i64,
    user_id: Option<i64>,
) -> Result<Vec<Rating>> {
    let sql = ratings_sql(user_id.is_some());
    let mut query = sqlx::query(&sql).bind(business_id);
    if let Some(user_id) = user_id {
        query = query.bind(user_id);
    }
    let rows = query.fetch_all(pool).await.context("Failed to list ratings")?;

    Ok(rows
        .iter()
        .map(|row| Rating {
            id: row.get("id"),
            business_id: row.get("business_id"),
            user_id: row.get("user_id"),
            comment_id: row.get("comment_id"),
            score: row.get("score"),
            created_at: row.get("created_at"),
        })
        .collect())
}

async fn comments_with_score_sqlite(
    pool: &SqlitePool,
    business_id: i64,
) -> Result<Vec<CommentWithScore>> {
    let rows = sqlx::query(COMMENTS_WITH_SCORE)
        .bind(business_id)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    Ok(rows
        .iter()
        .map(|row| CommentWithScore {
            id: row.get("id"),
            user_id: row.get("user_id"),
            username: row.get("username"),
            text: row.get("text"),
            score: row.get("score"),
            created_at: row.get("created_at"),
        })
        .collect())
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn get_comment_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query("SELECT id, business_id, user_id, text, created_at FROM comments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get comment by ID")?;

    Ok(row.map(|row| Comment {
        id: row.get("id"),
        business_id: row.get("business_id"),
        user_id: row.get("user_id"),
        text: row.get("text"),
        created_at: row.get("created_at"),
    }))
}

async fn list_ratings_mysql(
    pool: &MySqlPool,
    business_id: i64,
    user_id: Option<i64>,
) -> Result<Vec<Rating>> {
    let sql = ratings_sql(user_id.is_some());
    let mut query = sqlx::query(&sql).bind(business_id);
    if let Some(user_id) = user_id {
        query = query.bind(user_id);
    }
    let rows = query.fetch_all(pool).await.context("Failed to list ratings")?;

    Ok(rows
        .iter()
        .map(|row| Rating {
            id: row.get("id"),
            business_id: row.get("business_id"),
            user_id: row.get("user_id"),
            comment_id: row.get("comment_id"),
            score: row.get("score"),
            created_at: row.get("created_at"),
        })
        .collect())
}

async fn comments_with_score_mysql(
    pool: &MySqlPool,
    business_id: i64,
) -> Result<Vec<CommentWithScore>> {
    let rows = sqlx::query(COMMENTS_WITH_SCORE)
        .bind(business_id)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    Ok(rows
        .iter()
        .map(|row| CommentWithScore {
            id: row.get("id"),
            user_id: row.get("user_id"),
            username: row.get("username"),
            text: row.get("text"),
            score: row.get("score"),
            created_at: row.get("created_at"),
        })
        .collect())
}
