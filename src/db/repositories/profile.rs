//! Profile and rank repository
//!
//! `profiles.user_id` is UNIQUE; `insert_if_absent` relies on it so that
//! concurrent get-or-create calls still leave exactly one row per user.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ProfileView, Rank, UserProfile};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetch a rank by name, creating it first if needed
    async fn get_or_create_rank(&self, name: &str) -> Result<Rank>;

    async fn get_by_user(&self, user_id: i64) -> Result<Option<UserProfile>>;

    /// Insert a profile unless one exists; true when a row was created
    async fn insert_if_absent(&self, user_id: i64, rank_id: Option<i64>) -> Result<bool>;

    /// Overwrite bio and avatar
    async fn update(&self, user_id: i64, bio: Option<&str>, avatar: Option<&str>) -> Result<bool>;

    async fn set_rank(&self, user_id: i64, rank_id: i64) -> Result<bool>;

    async fn view_by_user(&self, user_id: i64) -> Result<Option<ProfileView>>;

    async fn view_by_username(&self, username: &str) -> Result<Option<ProfileView>>;

    /// Every profile, ordered by username
    async fn list_views(&self) -> Result<Vec<ProfileView>>;
}

pub struct SqlxProfileRepository {
    pool: DynDatabasePool,
}

impl SqlxProfileRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ProfileRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ProfileRepository for SqlxProfileRepository {
    async fn get_or_create_rank(&self, name: &str) -> Result<Rank> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_or_create_rank_sqlite(self.pool.as_sqlite().unwrap(), name).await
            }
            DatabaseDriver::Mysql => {
                get_or_create_rank_mysql(self.pool.as_mysql().unwrap(), name).await
            }
        }
    }

    async fn get_by_user(&self, user_id: i64) -> Result<Option<UserProfile>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_profile_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Mysql => get_profile_mysql(self.pool.as_mysql().unwrap(), user_id).await,
        }
    }

    async fn insert_if_absent(&self, user_id: i64, rank_id: Option<i64>) -> Result<bool> {
        let now = Utc::now();
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(
                "INSERT OR IGNORE INTO profiles (user_id, rank_id, created_at, updated_at) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(user_id)
            .bind(rank_id)
            .bind(now)
            .bind(now)
            .execute(self.pool.as_sqlite().unwrap())
            .await
            .context("Failed to create profile")?
            .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(
                "INSERT IGNORE INTO profiles (user_id, rank_id, created_at, updated_at) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(user_id)
            .bind(rank_id)
            .bind(now)
            .bind(now)
            .execute(self.pool.as_mysql().unwrap())
            .await
            .context("Failed to create profile")?
            .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn update(&self, user_id: i64, bio: Option<&str>, avatar: Option<&str>) -> Result<bool> {
        let sql = "UPDATE profiles SET bio = ?, avatar = ?, updated_at = ? WHERE user_id = ?";
        let now = Utc::now();
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(bio)
                .bind(avatar)
                .bind(now)
                .bind(user_id)
                .execute(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to update profile")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(bio)
                .bind(avatar)
                .bind(now)
                .bind(user_id)
                .execute(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to update profile")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn set_rank(&self, user_id: i64, rank_id: i64) -> Result<bool> {
        let sql = "UPDATE profiles SET rank_id = ?, updated_at = ? WHERE user_id = ?";
        let now = Utc::now();
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(rank_id)
                .bind(now)
                .bind(user_id)
                .execute(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to set rank")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(rank_id)
                .bind(now)
                .bind(user_id)
                .execute(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to set rank")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn view_by_user(&self, user_id: i64) -> Result<Option<ProfileView>> {
        let sql = format!("{} WHERE u.id = ?", VIEW_SQL);
        let views = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .bind(user_id)
                    .fetch_all(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to load profile")?;
                rows.iter().map(row_to_view_sqlite).collect::<Vec<_>>()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .bind(user_id)
                    .fetch_all(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to load profile")?;
                rows.iter().map(row_to_view_mysql).collect::<Vec<_>>()
            }
        };
        Ok(views.into_iter().next())
    }

    async fn view_by_username(&self, username: &str) -> Result<Option<ProfileView>> {
        let sql = format!("{} WHERE u.username = ?", VIEW_SQL);
        let views = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .bind(username)
                    .fetch_all(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to load profile")?;
                rows.iter().map(row_to_view_sqlite).collect::<Vec<_>>()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .bind(username)
                    .fetch_all(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to load profile")?;
                rows.iter().map(row_to_view_mysql).collect::<Vec<_>>()
            }
        };
        Ok(views.into_iter().next())
    }

    async fn list_views(&self) -> Result<Vec<ProfileView>> {
        let sql = format!("{} ORDER BY u.username", VIEW_SQL);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .fetch_all(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to list profiles")?;
                Ok(rows.iter().map(row_to_view_sqlite).collect())
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .fetch_all(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to list profiles")?;
                Ok(rows.iter().map(row_to_view_mysql).collect())
            }
        }
    }
}

const PROFILE_COLUMNS: &str = "id, user_id, rank_id, bio, avatar, created_at, updated_at";

const VIEW_SQL: &str = r#"
    SELECT p.id, p.user_id, p.rank_id, p.bio, p.avatar, p.created_at, p.updated_at,
           u.username, u.email, r.name AS rank_name
    FROM profiles p
    JOIN users u ON u.id = p.user_id
    LEFT JOIN ranks r ON r.id = p.rank_id
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn get_or_create_rank_sqlite(pool: &SqlitePool, name: &str) -> Result<Rank> {
    sqlx::query("INSERT OR IGNORE INTO ranks (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await
        .context("Failed to create rank")?;

    let row = sqlx::query("SELECT id, name FROM ranks WHERE name = ?")
        .bind(name)
        .fetch_one(pool)
        .await
        .context("Failed to load rank")?;
    Ok(Rank {
        id: row.get("id"),
        name: row.get("name"),
    })
}

async fn get_profile_sqlite(pool: &SqlitePool, user_id: i64) -> Result<Option<UserProfile>> {
    let sql = format!("SELECT {} FROM profiles WHERE user_id = ?", PROFILE_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get profile")?;

    Ok(row.as_ref().map(row_to_profile_sqlite))
}

fn row_to_profile_sqlite(row: &sqlx::sqlite::SqliteRow) -> UserProfile {
    UserProfile {
        id: row.get("id"),
        user_id: row.get("user_id"),
        rank_id: row.get("rank_id"),
        bio: row.get("bio"),
        avatar: row.get("avatar"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_view_sqlite(row: &sqlx::sqlite::SqliteRow) -> ProfileView {
    let profile = row_to_profile_sqlite(row);
    let username: String = row.get("username");
    let email: String = row.get("email");
    ProfileView::new(&profile, &username, &email, row.get("rank_name"))
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn get_or_create_rank_mysql(pool: &MySqlPool, name: &str) -> Result<Rank> {
    sqlx::query("INSERT IGNORE INTO ranks (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await
        .context("Failed to create rank")?;

    let row = sqlx::query("SELECT id, name FROM ranks WHERE name = ?")
        .bind(name)
        .fetch_one(pool)
        .await
        .context("Failed to load rank")?;
    Ok(Rank {
        id: row.get("id"),
        name: row.get("name"),
    })
}

async fn get_profile_mysql(pool: &MySqlPool, user_id: i64) -> Result<Option<UserProfile>> {
    let sql = format!("SELECT {} FROM profiles WHERE user_id = ?", PROFILE_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get profile")?;

    Ok(row.as_ref().map(row_to_profile_mysql))
}

fn row_to_profile_mysql(row: &sqlx::mysql::MySqlRow) -> UserProfile {
    UserProfile {
        id: row.get("id"),
        user_id: row.get("user_id"),
        rank_id: row.get("rank_id"),
        bio: row.get("bio"),
        avatar: row.get("avatar"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_view_mysql(row: &sqlx::mysql::MySqlRow) -> ProfileView {
    let profile = row_to_profile_mysql(row);
    let username: String = row.get("username");
    let email: String = row.get("email");
    ProfileView::new(&profile, &username, &email, row.get("rank_name"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_user, setup_pool};

    #[tokio::test]
    async fn test_rank_get_or_create_is_stable() {
        let repo = SqlxProfileRepository::new(setup_pool().await);
        let first = repo.get_or_create_rank("Visitante").await.unwrap();
        let again = repo.get_or_create_rank("Visitante").await.unwrap();
        assert_eq!(first, again);
        assert_ne!(repo.get_or_create_rank("Guía").await.unwrap().id, first.id);
    }

    #[tokio::test]
    async fn test_insert_if_absent_creates_once() {
        let pool = setup_pool().await;
        let user = insert_user(&pool, "ana").await;
        let repo = SqlxProfileRepository::new(pool);
        let rank = repo.get_or_create_rank("Visitante").await.unwrap();

        assert!(repo.insert_if_absent(user, Some(rank.id)).await.unwrap());
        assert!(!repo.insert_if_absent(user, None).await.unwrap());

        let profile = repo.get_by_user(user).await.unwrap().unwrap();
        assert_eq!(profile.rank_id, Some(rank.id));
    }

    #[tokio::test]
    async fn test_views_join_username_and_rank() {
        let pool = setup_pool().await;
        let ana = insert_user(&pool, "ana").await;
        let beto = insert_user(&pool, "beto").await;
        let repo = SqlxProfileRepository::new(pool);
        let rank = repo.get_or_create_rank("Guía").await.unwrap();
        repo.insert_if_absent(ana, None).await.unwrap();
        repo.insert_if_absent(beto, None).await.unwrap();

        assert!(repo.set_rank(ana, rank.id).await.unwrap());
        assert!(repo.update(ana, Some("Hola"), Some("/media/ana.png")).await.unwrap());

        let view = repo.view_by_username("ana").await.unwrap().unwrap();
        assert_eq!(view.rank.as_deref(), Some("Guía"));
        assert_eq!(view.bio.as_deref(), Some("Hola"));
        assert_eq!(view.avatar_url, "/media/ana.png");

        let beto_view = repo.view_by_user(beto).await.unwrap().unwrap();
        assert!(beto_view.rank.is_none());
        assert!(beto_view.avatar_url.starts_with("https://www.gravatar.com/avatar/"));

        let names: Vec<_> = repo
            .list_views()
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.username)
            .collect();
        assert_eq!(names, vec!["ana", "beto"]);
        assert!(repo.view_by_username("nadie").await.unwrap().is_none());
    }
}
