//! Admin repository
//!
//! - `AdminRepository` trait defining admin account access
//! - `SqlxAdminRepository` implementing it for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::pool::{mysql, sqlite};
use crate::db::DynDatabasePool;
use crate::models::Admin;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const SELECT_ADMIN: &str =
    "SELECT id, email, name, password_hash, created_at, updated_at FROM admins";

/// Admin repository trait
#[async_trait]
pub trait AdminRepository: Send + Sync {
    /// Store a new admin, returning it with its assigned ID
    async fn create(&self, admin: &Admin) -> Result<Admin>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Admin>>;

    /// Lookup by login email (exact match)
    async fn get_by_email(&self, email: &str) -> Result<Option<Admin>>;

    async fn count(&self) -> Result<i64>;
}

/// SQLx-based admin repository
pub struct SqlxAdminRepository {
    pool: DynDatabasePool,
}

impl SqlxAdminRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AdminRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AdminRepository for SqlxAdminRepository {
    async fn create(&self, admin: &Admin) -> Result<Admin> {
        let now = Utc::now();
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => create_admin_sqlite(sqlite(&self.pool)?, admin, now).await?,
            DatabaseDriver::Mysql => create_admin_mysql(mysql(&self.pool)?, admin, now).await?,
        };

        Ok(Admin {
            id,
            created_at: now,
            updated_at: now,
            ..admin.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Admin>> {
        let sql = format!("{} WHERE id = ?", SELECT_ADMIN);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(sqlite(&self.pool)?)
                    .await
                    .context("Failed to get admin by ID")?;
                row.as_ref().map(row_to_admin_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(mysql(&self.pool)?)
                    .await
                    .context("Failed to get admin by ID")?;
                row.as_ref().map(row_to_admin_mysql).transpose()
            }
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Admin>> {
        let sql = format!("{} WHERE email = ?", SELECT_ADMIN);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(email)
                    .fetch_optional(sqlite(&self.pool)?)
                    .await
                    .context("Failed to get admin by email")?;
                row.as_ref().map(row_to_admin_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(email)
                    .fetch_optional(mysql(&self.pool)?)
                    .await
                    .context("Failed to get admin by email")?;
                row.as_ref().map(row_to_admin_mysql).transpose()
            }
        }
    }

    async fn count(&self) -> Result<i64> {
        let sql = "SELECT COUNT(*) AS count FROM admins";
        let count: i64 = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .fetch_one(sqlite(&self.pool)?)
                .await
                .context("Failed to count admins")?
                .get("count"),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .fetch_one(mysql(&self.pool)?)
                .await
                .context("Failed to count admins")?
                .get("count"),
        };
        Ok(count)
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_admin_sqlite(
    pool: &SqlitePool,
    admin: &Admin,
    now: chrono::DateTime<Utc>,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO admins (email, name, password_hash, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&admin.email)
    .bind(&admin.name)
    .bind(&admin.password_hash)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create admin")?;

    Ok(result.last_insert_rowid())
}

fn row_to_admin_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Admin> {
    Ok(Admin {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_admin_mysql(
    pool: &MySqlPool,
    admin: &Admin,
    now: chrono::DateTime<Utc>,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO admins (email, name, password_hash, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&admin.email)
    .bind(&admin.name)
    .bind(&admin.password_hash)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create admin")?;

    Ok(result.last_insert_id() as i64)
}

fn row_to_admin_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Admin> {
    Ok(Admin {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxAdminRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxAdminRepository::new(pool.clone());
        (pool, repo)
    }

    fn test_admin(email: &str) -> Admin {
        Admin::new(email.to_string(), Some("Moderator".to_string()), "hash123".to_string())
    }

    #[tokio::test]
    async fn test_create_admin() {
        let (_pool, repo) = setup_test_repo().await;

        let created = repo
            .create(&test_admin("admin@example.com"))
            .await
            .expect("Failed to create admin");

        assert!(created.id > 0);
        assert_eq!(created.email, "admin@example.com");
        assert_eq!(created.name.as_deref(), Some("Moderator"));
    }

    #[tokio::test]
    async fn test_get_by_id_and_email() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo.create(&test_admin("find@example.com")).await.unwrap();

        let by_id = repo.get_by_id(created.id).await.unwrap().expect("admin by id");
        assert_eq!(by_id.email, "find@example.com");
        assert_eq!(by_id.password_hash, "hash123");

        let by_email = repo
            .get_by_email("find@example.com")
            .await
            .unwrap()
            .expect("admin by email");
        assert_eq!(by_email.id, created.id);
    }

    #[tokio::test]
    async fn test_get_missing_admin() {
        let (_pool, repo) = setup_test_repo().await;

        assert!(repo.get_by_id(42).await.unwrap().is_none());
        assert!(repo.get_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unique_email_constraint() {
        let (_pool, repo) = setup_test_repo().await;

        repo.create(&test_admin("dup@example.com")).await.unwrap();
        let result = repo.create(&test_admin("dup@example.com")).await;

        assert!(result.is_err(), "Should fail due to duplicate email");
    }

    #[tokio::test]
    async fn test_count_admins() {
        let (_pool, repo) = setup_test_repo().await;
        assert_eq!(repo.count().await.unwrap(), 0);

        repo.create(&test_admin("one@example.com")).await.unwrap();
        repo.create(&test_admin("two@example.com")).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 2);
    }
}
