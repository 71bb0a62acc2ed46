//! Database layer
//!
//! SQLite is the default (single-binary deployment); MySQL is available for
//! larger installs. The driver is picked from `DatabaseConfig`.
//!
//! ```ignore
//! use blogdesk::config::DatabaseConfig;
//! use blogdesk::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, Database, DatabasePool, DynDatabasePool};
