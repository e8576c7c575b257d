//! Owner message repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{InboxMessage, OwnerMessage};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(&self, business_id: i64, sender_id: i64, body: &str) -> Result<OwnerMessage>;

    /// Messages addressed to any business owned by `owner_id`, newest first
    async fn inbox(&self, owner_id: i64) -> Result<Vec<InboxMessage>>;

    /// Flag a message read; only the owning user's messages match
    async fn mark_read(&self, id: i64, owner_id: i64) -> Result<bool>;
}

pub struct SqlxMessageRepository {
    pool: DynDatabasePool,
}

impl SqlxMessageRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn MessageRepository> {
        Arc::new(Self::new(pool))
    }
}

const INBOX_SQL: &str = r#"
    SELECT m.id, m.business_id, b.name AS business_name, u.username AS sender,
           m.body, m.is_read, m.created_at
    FROM owner_messages m
    JOIN businesses b ON b.id = m.business_id
    JOIN users u ON u.id = m.sender_id
    WHERE b.owner_id = ?
    ORDER BY m.created_at DESC, m.id DESC
"#;

const MARK_READ_SQL: &str = r#"
    UPDATE owner_messages SET is_read = ?
    WHERE id = ? AND business_id IN (SELECT id FROM businesses WHERE owner_id = ?)
"#;

#[async_trait]
impl MessageRepository for SqlxMessageRepository {
    async fn create(&self, business_id: i64, sender_id: i64, body: &str) -> Result<OwnerMessage> {
        let now = Utc::now();
        let sql = "INSERT INTO owner_messages (business_id, sender_id, body, is_read, created_at) \
                   VALUES (?, ?, ?, ?, ?)";
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(business_id)
                .bind(sender_id)
                .bind(body)
                .bind(false)
                .bind(now)
                .execute(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to create message")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(business_id)
                .bind(sender_id)
                .bind(body)
                .bind(false)
                .bind(now)
                .execute(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to create message")?
                .last_insert_id() as i64,
        };

        Ok(OwnerMessage {
            id,
            business_id,
            sender_id,
            body: body.to_string(),
            is_read: false,
            created_at: now,
        })
    }

    async fn inbox(&self, owner_id: i64) -> Result<Vec<InboxMessage>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(INBOX_SQL)
                    .bind(owner_id)
                    .fetch_all(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to load inbox")?;
                Ok(rows
                    .iter()
                    .map(|row| InboxMessage {
                        id: row.get("id"),
                        business_id: row.get("business_id"),
                        business_name: row.get("business_name"),
                        sender: row.get("sender"),
                        body: row.get("body"),
                        is_read: row.get("is_read"),
                        created_at: row.get("created_at"),
                    })
                    .collect())
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(INBOX_SQL)
                    .bind(owner_id)
                    .fetch_all(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to load inbox")?;
                Ok(rows
                    .iter()
                    .map(|row| InboxMessage {
                        id: row.get("id"),
                        business_id: row.get("business_id"),
                        business_name: row.get("business_name"),
                        sender: row.get("sender"),
                        body: row.get("body"),
                        is_read: row.get("is_read"),
                        created_at: row.get("created_at"),
                    })
                    .collect())
            }
        }
    }

    async fn mark_read(&self, id: i64, owner_id: i64) -> Result<bool> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(MARK_READ_SQL)
                .bind(true)
                .bind(id)
                .bind(owner_id)
                .execute(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to mark message read")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(MARK_READ_SQL)
                .bind(true)
                .bind(id)
                .bind(owner_id)
                .execute(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to mark message read")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }
}
