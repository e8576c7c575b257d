//! Post repository
//!
//! Stories, recipes and popular-knowledge entries share the `posts` table,
//! told apart by `kind`.

use super::SqlFilter;
use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{CreatePostInput, ListParams, ModerationStatus, PagedResult, Post, PostKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a post in `pending` state
    async fn create(&self, input: &CreatePostInput) -> Result<Post>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

    /// Newest first. `query` matches title, content or ingredients.
    async fn list(
        &self,
        kind: PostKind,
        status: Option<ModerationStatus>,
        query: Option<&str>,
        params: &ListParams,
    ) -> Result<PagedResult<Post>>;
}

pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, input: &CreatePostInput) -> Result<Post> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_post_sqlite(self.pool.as_sqlite().unwrap(), input).await,
            DatabaseDriver::Mysql => create_post_mysql(self.pool.as_mysql().unwrap(), input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_post_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_post_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list(
        &self,
        kind: PostKind,
        status: Option<ModerationStatus>,
        query: Option<&str>,
        params: &ListParams,
    ) -> Result<PagedResult<Post>> {
        let filter = SqlFilter::new()
            .eq("kind", kind.as_str())
            .eq_opt("status", status.map(|s| s.as_str()))
            .search(&["title", "content", "ingredients"], query);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_posts_sqlite(self.pool.as_sqlite().unwrap(), &filter, params).await
            }
            DatabaseDriver::Mysql => {
                list_posts_mysql(self.pool.as_mysql().unwrap(), &filter, params).await
            }
        }
    }
}

const POST_COLUMNS: &str =
    "id, kind, title, content, ingredients, image, status, author_id, created_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_post_sqlite(pool: &SqlitePool, input: &CreatePostInput) -> Result<Post> {
    let result = sqlx::query(
        r#"
        INSERT INTO posts (kind, title, content, ingredients, image, status, author_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(input.kind.as_str())
    .bind(&input.title)
    .bind(&input.content)
    .bind(&input.ingredients)
    .bind(&input.image)
    .bind(ModerationStatus::Pending.as_str())
    .bind(input.author_id)
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("Failed to create post")?;

    get_post_sqlite(pool, result.last_insert_rowid())
        .await?
        .context("Post not found after creation")
}

async fn get_post_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Post>> {
    let sql = format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by ID")?;

    row.as_ref().map(row_to_post_sqlite).transpose()
}

async fn list_posts_sqlite(
    pool: &SqlitePool,
    filter: &SqlFilter,
    params: &ListParams,
) -> Result<PagedResult<Post>> {
    let sql = format!(
        "SELECT {} FROM posts{} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        POST_COLUMNS,
        filter.where_sql()
    );
    let count_sql = format!("SELECT COUNT(*) FROM posts{}", filter.where_sql());
    let mut count = sqlx::query_scalar::<_, i64>(&count_sql);
    for value in filter.binds() {
        count = count.bind(value);
    }
    let total: i64 = count.fetch_one(pool).await.context("Failed to count posts")?;
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
        .context("Failed to list posts")?;

    let posts = rows.iter().map(row_to_post_sqlite).collect::<Result<Vec<_>>>()?;
    Ok(PagedResult::new(posts, total, params))
}

fn row_to_post_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Post> {
    let kind: String = row.get("kind");
    let status: String = row.get("status");
    Ok(Post {
        id: row.get("id"),
        kind: PostKind::from_str(&kind)?,
        title: row.get("title"),
        content: row.get("content"),
        ingredients: row.get("ingredients"),
        image: row.get("image"),
        status: ModerationStatus::from_str(&status)?,
        author_id: row.get("author_id"),
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_post_mysql(pool: &MySqlPool, input: &CreatePostInput) -> Result<Post> {
    let result = sqlx::query(
        r#"
        INSERT INTO posts (kind, title, content, ingredients, image, status, author_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(input.kind.as_str())
    .bind(&input.title)
    .bind(&input.content)
    .bind(&input.ingredients)
    .bind(&input.image)
    .bind(ModerationStatus::Pending.as_str())
    .bind(input.author_id)
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("Failed to create post")?;

    get_post_mysql(pool, result.last_insert_id() as i64)
        .await?
        .context("Post not found after creation")
}

async fn get_post_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Post>> {
    let sql = format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by ID")?;

    row.as_ref().map(row_to_post_mysql).transpose()
}

async fn list_posts_mysql(
    pool: &MySqlPool,
    filter: &SqlFilter,
    params: &ListParams,
) -> Result<PagedResult<Post>> {
    let sql = format!(
        "SELECT {} FROM posts{} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        POST_COLUMNS,
        filter.where_sql()
    );
    let count_sql = format!("SELECT COUNT(*) FROM posts{}", filter.where_sql());
    let mut count = sqlx::query_scalar::<_, i64>(&count_sql);
    for value in filter.binds() {
        count = count.bind(value);
    }
    let total: i64 = count.fetch_one(pool).await.context("Failed to count posts")?;
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
        .context("Failed to list posts")?;

    let posts = rows.iter().map(row_to_post_mysql).collect::<Result<Vec<_>>>()?;
    Ok(PagedResult::new(posts, total, params))
}

fn row_to_post_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Post> {
    let kind: String = row.get("kind");
    let status: String = row.get("status");
    Ok(Post {
        id: row.get("id"),
        kind: PostKind::from_str(&kind)?,
        title: row.get("title"),
        content: row.get("content"),
        ingredients: row.get("ingredients"),
        image: row.get("image"),
        status: ModerationStatus::from_str(&status)?,
        author_id: row.get("author_id"),
        created_at: row.get("created_at"),
    })
}
