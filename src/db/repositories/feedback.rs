//! Feedback repository
//!
//! Moderator notes attached to a blog. Rows are removed with their blog.

use crate::config::DatabaseDriver;
use crate::db::pool::{mysql, sqlite};
use crate::db::DynDatabasePool;
use crate::models::Feedback;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

const INSERT_FEEDBACK: &str =
    "INSERT INTO blog_feedback (blog_id, admin_id, message, created_at) VALUES (?, ?, ?, ?)";

const LIST_FEEDBACK: &str = r#"
    SELECT id, blog_id, admin_id, message, created_at
    FROM blog_feedback
    WHERE blog_id = ?
    ORDER BY created_at DESC, id DESC
"#;

/// Feedback repository trait
#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    async fn create(&self, blog_id: i64, admin_id: i64, message: &str) -> Result<Feedback>;

    /// Feedback for one blog, newest first
    async fn list_by_blog(&self, blog_id: i64) -> Result<Vec<Feedback>>;
}

/// SQLx-based feedback repository
pub struct SqlxFeedbackRepository {
    pool: DynDatabasePool,
}

impl SqlxFeedbackRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn FeedbackRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl FeedbackRepository for SqlxFeedbackRepository {
    async fn create(&self, blog_id: i64, admin_id: i64, message: &str) -> Result<Feedback> {
        let now = Utc::now();
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(INSERT_FEEDBACK)
                .bind(blog_id)
                .bind(admin_id)
                .bind(message)
                .bind(now)
                .execute(sqlite(&self.pool)?)
                .await
                .context("Failed to create feedback")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(INSERT_FEEDBACK)
                .bind(blog_id)
                .bind(admin_id)
                .bind(message)
                .bind(now)
                .execute(mysql(&self.pool)?)
                .await
                .context("Failed to create feedback")?
                .last_insert_id() as i64,
        };

        Ok(Feedback {
            id,
            blog_id,
            admin_id,
            message: message.to_string(),
            created_at: now,
        })
    }

    async fn list_by_blog(&self, blog_id: i64) -> Result<Vec<Feedback>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(LIST_FEEDBACK)
                    .bind(blog_id)
                    .fetch_all(sqlite(&self.pool)?)
                    .await
                    .context("Failed to list feedback")?;
                rows.iter().map(row_to_feedback_sqlite).collect()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(LIST_FEEDBACK)
                    .bind(blog_id)
                    .fetch_all(mysql(&self.pool)?)
                    .await
                    .context("Failed to list feedback")?;
                rows.iter().map(row_to_feedback_mysql).collect()
            }
        }
    }
}

fn row_to_feedback_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Feedback> {
    Ok(Feedback {
        id: row.try_get("id")?,
        blog_id: row.try_get("blog_id")?,
        admin_id: row.try_get("admin_id")?,
        message: row.try_get("message")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_feedback_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Feedback> {
    Ok(Feedback {
        id: row.try_get("id")?,
        blog_id: row.try_get("blog_id")?,
        admin_id: row.try_get("admin_id")?,
        message: row.try_get("message")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        AdminRepository, BlogRepository, SqlxAdminRepository, SqlxBlogRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Admin, Blog, BlogStatus};

    struct Fixture {
        feedback: SqlxFeedbackRepository,
        blogs: SqlxBlogRepository,
        blog_id: i64,
        admin_id: i64,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let admins = SqlxAdminRepository::new(pool.clone());
        let admin = admins
            .create(&Admin::new("mod@example.com".to_string(), None, "hash".to_string()))
            .await
            .unwrap();

        let blogs = SqlxBlogRepository::new(pool.clone());
        let now = Utc::now();
        let blog = blogs
            .create(&Blog {
                id: 0,
                title: "Needs work".to_string(),
                excerpt: String::new(),
                content: "body".to_string(),
                content_html: "<p>body</p>".to_string(),
                author: "Anonymous".to_string(),
                author_email: None,
                image: None,
                status: BlogStatus::Pending,
                views: 0,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        Fixture {
            feedback: SqlxFeedbackRepository::new(pool),
            blogs,
            blog_id: blog.id,
            admin_id: admin.id,
        }
    }

    #[tokio::test]
    async fn test_create_and_list_feedback() {
        let fx = setup().await;

        let first = fx
            .feedback
            .create(fx.blog_id, fx.admin_id, "Add a conclusion")
            .await
            .expect("Failed to create feedback");
        assert!(first.id > 0);
        fx.feedback
            .create(fx.blog_id, fx.admin_id, "Fix the typos")
            .await
            .unwrap();

        let list = fx.feedback.list_by_blog(fx.blog_id).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].message, "Fix the typos");
        assert_eq!(list[1].message, "Add a conclusion");
        assert!(fx.feedback.list_by_blog(fx.blog_id + 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_feedback_requires_existing_blog() {
        let fx = setup().await;
        let result = fx.feedback.create(fx.blog_id + 50, fx.admin_id, "orphan").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_feedback_removed_with_blog() {
        let fx = setup().await;
        fx.feedback.create(fx.blog_id, fx.admin_id, "note").await.unwrap();

        fx.blogs.delete(fx.blog_id).await.unwrap();

        assert!(fx.feedback.list_by_blog(fx.blog_id).await.unwrap().is_empty());
    }
}
