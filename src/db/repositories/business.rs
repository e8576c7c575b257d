//! Business repository
//!
//! Directory listings plus the cached `average_rating` column, which is
//! recomputed from the `ratings` table on every rating save.

use super::SqlFilter;
use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{round2, Business, CreateBusinessInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait BusinessRepository: Send + Sync {
    async fn create(&self, input: &CreateBusinessInput) -> Result<Business>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Business>>;

    /// Oldest business carrying exactly this name
    async fn find_first_by_name(&self, name: &str) -> Result<Option<Business>>;

    /// Persist every editable column of `business`
    async fn update(&self, business: &Business) -> Result<Business>;

    async fn delete(&self, id: i64) -> Result<bool>;

    /// All businesses, optionally narrowed to addresses containing `address`
    async fn list(&self, address: Option<&str>) -> Result<Vec<Business>>;

    async fn list_owned(&self, owner_id: i64) -> Result<Vec<Business>>;

    async fn distinct_addresses(&self) -> Result<Vec<String>>;

    async fn set_owner(&self, id: i64, owner_id: i64) -> Result<bool>;

    /// Recompute and store the mean rating; returns the stored value
    async fn refresh_average(&self, id: i64) -> Result<f64>;
}

pub struct SqlxBusinessRepository {
    pool: DynDatabasePool,
}

impl SqlxBusinessRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BusinessRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl BusinessRepository for SqlxBusinessRepository {
    async fn create(&self, input: &CreateBusinessInput) -> Result<Business> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_business_sqlite(self.pool.as_sqlite().unwrap(), input).await
            }
            DatabaseDriver::Mysql => {
                create_business_mysql(self.pool.as_mysql().unwrap(), input).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Business>> {
        let sql = format!("SELECT {} FROM businesses WHERE id = ?", BUSINESS_COLUMNS);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to get business by ID")?;
                Ok(row.as_ref().map(row_to_business_sqlite))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to get business by ID")?;
                Ok(row.as_ref().map(row_to_business_mysql))
            }
        }
    }

    async fn find_first_by_name(&self, name: &str) -> Result<Option<Business>> {
        let sql = format!(
            "SELECT {} FROM businesses WHERE name = ? ORDER BY id LIMIT 1",
            BUSINESS_COLUMNS
        );
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(name)
                    .fetch_optional(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to find business by name")?;
                Ok(row.as_ref().map(row_to_business_sqlite))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(name)
                    .fetch_optional(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to find business by name")?;
                Ok(row.as_ref().map(row_to_business_mysql))
            }
        }
    }

    async fn update(&self, business: &Business) -> Result<Business> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_business_sqlite(self.pool.as_sqlite().unwrap(), business).await?
            }
            DatabaseDriver::Mysql => {
                update_business_mysql(self.pool.as_mysql().unwrap(), business).await?
            }
        }
        self.get_by_id(business.id)
            .await?
            .context("Business not found after update")
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = "DELETE FROM businesses WHERE id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(id)
                .execute(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to delete business")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(id)
                .execute(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to delete business")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn list(&self, address: Option<&str>) -> Result<Vec<Business>> {
        let filter = SqlFilter::new().search(&["address"], address);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_businesses_sqlite(self.pool.as_sqlite().unwrap(), &filter).await
            }
            DatabaseDriver::Mysql => {
                list_businesses_mysql(self.pool.as_mysql().unwrap(), &filter).await
            }
        }
    }

    async fn list_owned(&self, owner_id: i64) -> Result<Vec<Business>> {
        let filter = SqlFilter::new().eq("owner_id", owner_id.to_string());
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_businesses_sqlite(self.pool.as_sqlite().unwrap(), &filter).await
            }
            DatabaseDriver::Mysql => {
                list_businesses_mysql(self.pool.as_mysql().unwrap(), &filter).await
            }
        }
    }

    async fn distinct_addresses(&self) -> Result<Vec<String>> {
        let sql = "SELECT DISTINCT address FROM businesses ORDER BY address";
        let addresses = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query_scalar(sql)
                .fetch_all(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to list addresses")?,
            DatabaseDriver::Mysql => sqlx::query_scalar(sql)
                .fetch_all(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to list addresses")?,
        };
        Ok(addresses)
    }

    async fn set_owner(&self, id: i64, owner_id: i64) -> Result<bool> {
        let sql = "UPDATE businesses SET owner_id = ?, updated_at = ? WHERE id = ?";
        let now = Utc::now();
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(owner_id)
                .bind(now)
                .bind(id)
                .execute(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to set business owner")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(owner_id)
                .bind(now)
                .bind(id)
                .execute(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to set business owner")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn refresh_average(&self, id: i64) -> Result<f64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                refresh_average_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => refresh_average_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }
}

const BUSINESS_COLUMNS: &str = "id, name, description, category_id, address, hours, phone, \
     email, website, owner_id, created_by, average_rating, photo, created_at, updated_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_business_sqlite(pool: &SqlitePool, input: &CreateBusinessInput) -> Result<Business> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO businesses (name, description, category_id, address, hours, phone, email,
                                website, owner_id, created_by, photo, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.name)
    .bind(&input.description)
    .bind(input.category_id)
    .bind(&input.address)
    .bind(&input.hours)
    .bind(&input.phone)
    .bind(&input.email)
    .bind(&input.website)
    .bind(input.owner_id)
    .bind(input.created_by)
    .bind(&input.photo)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create business")?;

    let sql = format!("SELECT {} FROM businesses WHERE id = ?", BUSINESS_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(result.last_insert_rowid())
        .fetch_one(pool)
        .await
        .context("Business not found after creation")?;
    Ok(row_to_business_sqlite(&row))
}

async fn update_business_sqlite(pool: &SqlitePool, business: &Business) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE businesses
        SET name = ?, description = ?, category_id = ?, address = ?, hours = ?, phone = ?,
            email = ?, website = ?, photo = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&business.name)
    .bind(&business.description)
    .bind(business.category_id)
    .bind(&business.address)
    .bind(&business.hours)
    .bind(&business.phone)
    .bind(&business.email)
    .bind(&business.website)
    .bind(&business.photo)
    .bind(Utc::now())
    .bind(business.id)
    .execute(pool)
    .await
    .context("Failed to update business")?;
    Ok(())
}

async fn list_businesses_sqlite(pool: &SqlitePool, filter: &SqlFilter) -> Result<Vec<Business>> {
    let sql = format!(
        "SELECT {} FROM businesses{} ORDER BY name, id",
        BUSINESS_COLUMNS,
        filter.where_sql()
    );
    let mut query = sqlx::query(&sql);
    for value in filter.binds() {
        query = query.bind(value);
    }
    let rows = query.fetch_all(pool).await.context("Failed to list businesses")?;
    Ok(rows.iter().map(row_to_business_sqlite).collect())
}

async fn refresh_average_sqlite(pool: &SqlitePool, id: i64) -> Result<f64> {
    let avg: Option<f64> = sqlx::query_scalar("SELECT AVG(score) FROM ratings WHERE business_id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
        .context("Failed to aggregate ratings")?;
    let average = round2(avg.unwrap_or(0.0));

    sqlx::query("UPDATE businesses SET average_rating = ? WHERE id = ?")
        .bind(average)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to store average rating")?;
    Ok(average)
}

fn row_to_business_sqlite(row: &sqlx::sqlite::SqliteRow) -> Business {
    Business {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        category_id: row.get("category_id"),
        address: row.get("address"),
        hours: row.get("hours"),
        phone: row.get("phone"),
        email: row.get("email"),
        website: row.get("website"),
        owner_id: row.get("owner_id"),
        created_by: row.get("created_by"),
        average_rating: row.get("average_rating"),
        photo: row.get("photo"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_business_mysql(pool: &MySqlPool, input: &CreateBusinessInput) -> Result<Business> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO businesses (name, description, category_id, address, hours, phone, email,
                                website, owner_id, created_by, photo, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.name)
    .bind(&input.description)
    .bind(input.category_id)
    .bind(&input.address)
    .bind(&input.hours)
    .bind(&input.phone)
    .bind(&input.email)
    .bind(&input.website)
    .bind(input.owner_id)
    .bind(input.created_by)
    .bind(&input.photo)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create business")?;

    let sql = format!("SELECT {} FROM businesses WHERE id = ?", BUSINESS_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(result.last_insert_id() as i64)
        .fetch_one(pool)
        .await
        .context("Business not found after creation")?;
    Ok(row_to_business_mysql(&row))
}

async fn update_business_mysql(pool: &MySqlPool, business: &Business) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE businesses
        SET name = ?, description = ?, category_id = ?, address = ?, hours = ?, phone = ?,
            email = ?, website = ?, photo = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&business.name)
    .bind(&business.description)
    .bind(business.category_id)
    .bind(&business.address)
    .bind(&business.hours)
    .bind(&business.phone)
    .bind(&business.email)
    .bind(&business.website)
    .bind(&business.photo)
    .bind(Utc::now())
    .bind(business.id)
    .execute(pool)
    .await
    .context("Failed to update business")?;
    Ok(())
}

async fn list_businesses_mysql(pool: &MySqlPool, filter: &SqlFilter) -> Result<Vec<Business>> {
    let sql = format!(
        "SELECT {} FROM businesses{} ORDER BY name, id",
        BUSINESS_COLUMNS,
        filter.where_sql()
    );
    let mut query = sqlx::query(&sql);
    for value in filter.binds() {
        query = query.bind(value);
    }
    let rows = query.fetch_all(pool).await.context("Failed to list businesses")?;
    Ok(rows.iter().map(row_to_business_mysql).collect())
}

async fn refresh_average_mysql(pool: &MySqlPool, id: i64) -> Result<f64> {
    // AVG over INT yields DECIMAL on MySQL
    let avg: Option<f64> =
        sqlx::query_scalar("SELECT CAST(AVG(score) AS DOUBLE) FROM ratings WHERE business_id = ?")
            .bind(id)
            .fetch_one(pool)
            .await
            .context("Failed to aggregate ratings")?;
    let average = round2(avg.unwrap_or(0.0));

    sqlx::query("UPDATE businesses SET average_rating = ? WHERE id = ?")
        .bind(average)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to store average rating")?;
    Ok(average)
}

fn row_to_business_mysql(row: &sqlx::mysql::MySqlRow) -> Business {
    Business {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        category_id: row.get("category_id"),
        address: row.get("address"),
        hours: row.get("hours"),
        phone: row.get("phone"),
        email: row.get("email"),
        website: row.get("website"),
        owner_id: row.get("owner_id"),
        created_by: row.get("created_by"),
        average_rating: row.get("average_rating"),
        photo: row.get("photo"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_business, insert_user, setup_pool};
    use crate::models::UpdateBusinessInput;

    async fn add_rating(pool: &DynDatabasePool, business_id: i64, user_id: i64, score: i32) {
        sqlx::query("INSERT INTO ratings (business_id, user_id, score) VALUES (?, ?, ?)")
            .bind(business_id)
            .bind(user_id)
            .bind(score)
            .execute(pool.as_sqlite().unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_defaults() {
        let pool = setup_pool().await;
        let repo = SqlxBusinessRepository::new(pool.clone());
        let id = insert_business(&pool, "Casa Pellas", None).await;

        let business = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(business.name, "Casa Pellas");
        assert_eq!(business.average_rating, 0.0);
        assert_eq!(business.hours, "");
        assert!(business.owner_id.is_none());
    }

    #[tokio::test]
    async fn test_find_first_by_name_prefers_oldest() {
        let pool = setup_pool().await;
        let repo = SqlxBusinessRepository::new(pool.clone());
        let first = insert_business(&pool, "El Garabato", None).await;
        insert_business(&pool, "El Garabato", None).await;

        let found = repo.find_first_by_name("El Garabato").await.unwrap().unwrap();
        assert_eq!(found.id, first);
        assert!(repo.find_first_by_name("el garabato ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_and_owner() {
        let pool = setup_pool().await;
        let owner = insert_user(&pool, "dueno").await;
        let repo = SqlxBusinessRepository::new(pool.clone());
        let id = insert_business(&pool, "Hotel Plaza", None).await;

        let mut business = repo.get_by_id(id).await.unwrap().unwrap();
        business.apply(UpdateBusinessInput {
            hours: Some("24h".into()),
            ..Default::default()
        });
        let updated = repo.update(&business).await.unwrap();
        assert_eq!(updated.hours, "24h");

        assert!(repo.set_owner(id, owner).await.unwrap());
        assert_eq!(repo.list_owned(owner).await.unwrap().len(), 1);
        assert!(repo.delete(id).await.unwrap());
        assert!(repo.get_by_id(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters_by_address() {
        let pool = setup_pool().await;
        let repo = SqlxBusinessRepository::new(pool.clone());
        insert_business(&pool, "A", None).await;
        let mut leon = CreateBusinessInput {
            name: "B".into(),
            description: "x".into(),
            category_id: 1,
            address: "León, centro".into(),
            ..Default::default()
        };
        repo.create(&leon).await.unwrap();
        leon.name = "C".into();
        repo.create(&leon).await.unwrap();

        assert_eq!(repo.list(None).await.unwrap().len(), 3);
        assert_eq!(repo.list(Some("León")).await.unwrap().len(), 2);
        assert_eq!(
            repo.distinct_addresses().await.unwrap(),
            vec!["Granada".to_string(), "León, centro".to_string()]
        );
    }

    #[tokio::test]
    async fn test_refresh_average_rounds_and_defaults_to_zero() {
        let pool = setup_pool().await;
        let user = insert_user(&pool, "critica").await;
        let repo = SqlxBusinessRepository::new(pool.clone());
        let id = insert_business(&pool, "Soda", None).await;

        assert_eq!(repo.refresh_average(id).await.unwrap(), 0.0);

        for score in [4, 5, 5] {
            add_rating(&pool, id, user, score).await;
        }
        assert_eq!(repo.refresh_average(id).await.unwrap(), 4.67);
        let stored = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.average_rating, 4.67);
    }
}
