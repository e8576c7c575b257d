//! User repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ListParams, PagedResult, User, UserRole};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User>;

    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Persist email, password hash and role
    async fn update(&self, user: &User) -> Result<User>;

    /// Delete the account; dependent rows cascade
    async fn delete(&self, id: i64) -> Result<bool>;

    async fn count(&self) -> Result<i64>;

    async fn list(&self, params: &ListParams) -> Result<PagedResult<User>>;
}

pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_user_sqlite(self.pool.as_sqlite().unwrap(), user).await,
            DatabaseDriver::Mysql => create_user_mysql(self.pool.as_mysql().unwrap(), user).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_sqlite(self.pool.as_sqlite().unwrap(), UserLookup::Id(id)).await
            }
            DatabaseDriver::Mysql => {
                get_user_mysql(self.pool.as_mysql().unwrap(), UserLookup::Id(id)).await
            }
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_sqlite(self.pool.as_sqlite().unwrap(), UserLookup::Username(username)).await
            }
            DatabaseDriver::Mysql => {
                get_user_mysql(self.pool.as_mysql().unwrap(), UserLookup::Username(username)).await
            }
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_sqlite(self.pool.as_sqlite().unwrap(), UserLookup::Email(email)).await
            }
            DatabaseDriver::Mysql => {
                get_user_mysql(self.pool.as_mysql().unwrap(), UserLookup::Email(email)).await
            }
        }
    }

    async fn update(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_user_sqlite(self.pool.as_sqlite().unwrap(), user).await,
            DatabaseDriver::Mysql => update_user_mysql(self.pool.as_mysql().unwrap(), user).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query("DELETE FROM users WHERE id = ?")
                .bind(id)
                .execute(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to delete user")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query("DELETE FROM users WHERE id = ?")
                .bind(id)
                .execute(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to delete user")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query_scalar("SELECT COUNT(*) FROM users")
                .fetch_one(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to count users")?,
            DatabaseDriver::Mysql => sqlx::query_scalar("SELECT COUNT(*) FROM users")
                .fetch_one(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to count users")?,
        };
        Ok(count)
    }

    async fn list(&self, params: &ListParams) -> Result<PagedResult<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_users_sqlite(self.pool.as_sqlite().unwrap(), params).await,
            DatabaseDriver::Mysql => list_users_mysql(self.pool.as_mysql().unwrap(), params).await,
        }
    }
}

const USER_COLUMNS: &str = "id, username, email, password_hash, role, created_at, updated_at";

/// Unique keys a user can be fetched by
#[derive(Debug, Clone, Copy)]
enum UserLookup<'a> {
    Id(i64),
    Username(&'a str),
    /// Case-insensitive
    Email(&'a str),
}

impl UserLookup<'_> {
    fn predicate(&self) -> &'static str {
        match self {
            UserLookup::Id(_) => "id = ?",
            UserLookup::Username(_) => "username = ?",
            UserLookup::Email(_) => "LOWER(email) = LOWER(?)",
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, role, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role.to_string())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    let id = result.last_insert_rowid();
    get_user_sqlite(pool, UserLookup::Id(id))
        .await?
        .context("User not found after creation")
}

async fn get_user_sqlite(pool: &SqlitePool, lookup: UserLookup<'_>) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE {}", USER_COLUMNS, lookup.predicate());
    let query = sqlx::query(&sql);
    let query = match lookup {
        UserLookup::Id(id) => query.bind(id),
        UserLookup::Username(value) | UserLookup::Email(value) => query.bind(value),
    };
    let row = query.fetch_optional(pool).await.context("Failed to load user")?;

    row.as_ref().map(row_to_user_sqlite).transpose()
}

async fn update_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    sqlx::query(
        r#"
        UPDATE users
        SET email = ?, password_hash = ?, role = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role.to_string())
    .bind(Utc::now())
    .bind(user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    get_user_sqlite(pool, UserLookup::Id(user.id))
        .await?
        .context("User not found after update")
}

async fn list_users_sqlite(pool: &SqlitePool, params: &ListParams) -> Result<PagedResult<User>> {
    let sql = format!(
        "SELECT {} FROM users ORDER BY username LIMIT ? OFFSET ?",
        USER_COLUMNS
    );
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;
    let params = &params.clamp_to_total(total);

    let rows = sqlx::query(&sql)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list users")?;

    let users = rows.iter().map(row_to_user_sqlite).collect::<Result<Vec<_>>>()?;
    Ok(PagedResult::new(users, total, params))
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let role: String = row.get("role");
    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: UserRole::from_str(&role)
            .with_context(|| format!("Invalid role in database: {}", role))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, role, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role.to_string())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    let id = result.last_insert_id() as i64;
    get_user_mysql(pool, UserLookup::Id(id))
        .await?
        .context("User not found after creation")
}

async fn get_user_mysql(pool: &MySqlPool, lookup: UserLookup<'_>) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE {}", USER_COLUMNS, lookup.predicate());
    let query = sqlx::query(&sql);
    let query = match lookup {
        UserLookup::Id(id) => query.bind(id),
        UserLookup::Username(value) | UserLookup::Email(value) => query.bind(value),
    };
    let row = query.fetch_optional(pool).await.context("Failed to load user")?;

    row.as_ref().map(row_to_user_mysql).transpose()
}

async fn update_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    sqlx::query(
        r#"
        UPDATE users
        SET email = ?, password_hash = ?, role = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role.to_string())
    .bind(Utc::now())
    .bind(user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    get_user_mysql(pool, UserLookup::Id(user.id))
        .await?
        .context("User not found after update")
}

async fn list_users_mysql(pool: &MySqlPool, params: &ListParams) -> Result<PagedResult<User>> {
    let sql = format!(
        "SELECT {} FROM users ORDER BY username LIMIT ? OFFSET ?",
        USER_COLUMNS
    );
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;
    let params = &params.clamp_to_total(total);

    let rows = sqlx::query(&sql)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list users")?;

    let users = rows.iter().map(row_to_user_mysql).collect::<Result<Vec<_>>>()?;
    Ok(PagedResult::new(users, total, params))
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> Result<User> {
    let role: String = row.get("role");
    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: UserRole::from_str(&role)
            .with_context(|| format!("Invalid role in database: {}", role))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
