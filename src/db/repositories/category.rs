//! Category repository
//!
//! Business categories (restaurante, hotel, ...). Seeded by migration 4;
//! admins may add more.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Category;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Category repository trait
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Create a new category
    async fn create(&self, slug: &str, name: &str) -> Result<Category>;

    /// Get category by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Category>>;

    /// Get category by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>>;

    /// List all categories ordered by name
    async fn list(&self) -> Result<Vec<Category>>;
}

/// SQLx-based category repository implementation
pub struct SqlxCategoryRepository {
    pool: DynDatabasePool,
}

impl SqlxCategoryRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CategoryRepository for SqlxCategoryRepository {
    async fn create(&self, slug: &str, name: &str) -> Result<Category> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_category_sqlite(self.pool.as_sqlite().unwrap(), slug, name).await
            }
            DatabaseDriver::Mysql => {
                create_category_mysql(self.pool.as_mysql().unwrap(), slug, name).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Category>> {
        let sql = "SELECT id, slug, name FROM categories WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(sql)
                    .bind(id)
                    .fetch_optional(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to get category by ID")?;
                Ok(row.as_ref().map(row_to_category_sqlite))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(sql)
                    .bind(id)
                    .fetch_optional(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to get category by ID")?;
                Ok(row.as_ref().map(row_to_category_mysql))
            }
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_category_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await
            }
            DatabaseDriver::Mysql => {
                get_category_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await
            }
        }
    }

    async fn list(&self) -> Result<Vec<Category>> {
        let sql = "SELECT id, slug, name FROM categories ORDER BY name";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(sql)
                    .fetch_all(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to list categories")?;
                Ok(rows.iter().map(row_to_category_sqlite).collect())
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(sql)
                    .fetch_all(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to list categories")?;
                Ok(rows.iter().map(row_to_category_mysql).collect())
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_category_sqlite(pool: &SqlitePool, slug: &str, name: &str) -> Result<Category> {
    let result = sqlx::query("INSERT INTO categories (slug, name) VALUES (?, ?)")
        .bind(slug)
        .bind(name)
        .execute(pool)
        .await
        .context("Failed to create category")?;

    Ok(Category {
        id: result.last_insert_rowid(),
        slug: slug.to_string(),
        name: name.to_string(),
    })
}

async fn get_category_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Category>> {
    let row = sqlx::query("SELECT id, slug, name FROM categories WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get category by slug")?;

    Ok(row.as_ref().map(row_to_category_sqlite))
}

fn row_to_category_sqlite(row: &sqlx::sqlite::SqliteRow) -> Category {
    Category {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_category_mysql(pool: &MySqlPool, slug: &str, name: &str) -> Result<Category> {
    let result = sqlx::query("INSERT INTO categories (slug, name) VALUES (?, ?)")
        .bind(slug)
        .bind(name)
        .execute(pool)
        .await
        .context("Failed to create category")?;

    Ok(Category {
        id: result.last_insert_id() as i64,
        slug: slug.to_string(),
        name: name.to_string(),
    })
}

async fn get_category_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Category>> {
    let row = sqlx::query("SELECT id, slug, name FROM categories WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get category by slug")?;

    Ok(row.as_ref().map(row_to_category_mysql))
}

fn row_to_category_mysql(row: &sqlx::mysql::MySqlRow) -> Category {
    Category {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::setup_pool;

    #[tokio::test]
    async fn test_seeded_categories_listed_by_name() {
        let repo = SqlxCategoryRepository::new(setup_pool().await);
        let slugs: Vec<_> = repo.list().await.unwrap().into_iter().map(|c| c.slug).collect();
        assert_eq!(slugs, vec!["artesania", "hotel", "museo", "restaurante"]);
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let repo = SqlxCategoryRepository::new(setup_pool().await);
        let created = repo.create("mercado", "Mercado").await.unwrap();

        let by_slug = repo.get_by_slug("mercado").await.unwrap().unwrap();
        assert_eq!(by_slug, created);
        assert_eq!(repo.get_by_id(created.id).await.unwrap(), Some(created));
        assert!(repo.get_by_slug("nada").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let repo = SqlxCategoryRepository::new(setup_pool().await);
        assert!(repo.create("hotel", "Otro hotel").await.is_err());
    }
}
