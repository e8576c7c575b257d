//! Database layer
//!
//! SQLite is the default backend (a single file next to the binary); MySQL is
//! available for shared deployments. Both sit behind the `DatabasePool` trait,
//! and every repository dispatches on `DatabasePool::driver()`.
//!
//! ```ignore
//! let pool = directorio::db::create_pool(&config.database).await?;
//! directorio::db::migrations::run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
