//! Blog repository
//!
//! Persistence for submitted blogs and their moderation status.

use crate::config::DatabaseDriver;
use crate::db::pool::{mysql, sqlite};
use crate::db::DynDatabasePool;
use crate::models::{Blog, BlogStatus, UpdateBlogInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

const SELECT_BLOG: &str = r#"
    SELECT id, title, excerpt, content, content_html, author, author_email, image,
           status, views, created_at, updated_at
    FROM blogs
"#;

const INSERT_BLOG: &str = r#"
    INSERT INTO blogs (title, excerpt, content, content_html, author, author_email, image,
                       status, views, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
"#;

const UPDATE_BLOG: &str = r#"
    UPDATE blogs
    SET title = ?, excerpt = ?, content = ?, content_html = ?, author = ?, author_email = ?,
        image = ?, status = ?, updated_at = ?
    WHERE id = ?
"#;

/// Blog repository trait
#[async_trait]
pub trait BlogRepository: Send + Sync {
    /// Insert a blog. `id`, `views` and timestamps on the argument are ignored.
    async fn create(&self, blog: &Blog) -> Result<Blog>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Blog>>;

    /// All blogs, newest first
    async fn list_all(&self) -> Result<Vec<Blog>>;

    /// Apply a partial update. Returns `None` if the blog does not exist.
    async fn update(&self, id: i64, input: &UpdateBlogInput) -> Result<Option<Blog>>;

    /// Change only the moderation status. Returns `None` if the blog does not exist.
    async fn set_status(&self, id: i64, status: BlogStatus) -> Result<Option<Blog>>;

    /// Bump the view counter, returning false if the blog does not exist
    async fn increment_views(&self, id: i64) -> Result<bool>;

    /// Delete a blog, returning false if it did not exist
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Number of blogs per status. Statuses with no blogs are absent.
    async fn count_by_status(&self) -> Result<HashMap<BlogStatus, i64>>;
}

/// SQLx-based blog repository
pub struct SqlxBlogRepository {
    pool: DynDatabasePool,
}

impl SqlxBlogRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BlogRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl BlogRepository for SqlxBlogRepository {
    async fn create(&self, blog: &Blog) -> Result<Blog> {
        let now = Utc::now();
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => create_blog_sqlite(sqlite(&self.pool)?, blog, now).await?,
            DatabaseDriver::Mysql => create_blog_mysql(mysql(&self.pool)?, blog, now).await?,
        };

        Ok(Blog {
            id,
            views: 0,
            created_at: now,
            updated_at: now,
            ..blog.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Blog>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_blog_by_id_sqlite(sqlite(&self.pool)?, id).await,
            DatabaseDriver::Mysql => get_blog_by_id_mysql(mysql(&self.pool)?, id).await,
        }
    }

    async fn list_all(&self) -> Result<Vec<Blog>> {
        let sql = format!("{} ORDER BY created_at DESC, id DESC", SELECT_BLOG);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .fetch_all(sqlite(&self.pool)?)
                    .await
                    .context("Failed to list blogs")?;
                rows.iter().map(row_to_blog_sqlite).collect()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .fetch_all(mysql(&self.pool)?)
                    .await
                    .context("Failed to list blogs")?;
                rows.iter().map(row_to_blog_mysql).collect()
            }
        }
    }

    async fn update(&self, id: i64, input: &UpdateBlogInput) -> Result<Option<Blog>> {
        let Some(existing) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let updated = merge_update(existing, input, Utc::now());
        match self.pool.driver() {
            DatabaseDriver::Sqlite => write_blog_sqlite(sqlite(&self.pool)?, &updated).await?,
            DatabaseDriver::Mysql => write_blog_mysql(mysql(&self.pool)?, &updated).await?,
        }
        Ok(Some(updated))
    }

    async fn set_status(&self, id: i64, status: BlogStatus) -> Result<Option<Blog>> {
        let sql = "UPDATE blogs SET status = ?, updated_at = ? WHERE id = ?";
        let now = Utc::now();
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(status.as_str())
                .bind(now)
                .bind(id)
                .execute(sqlite(&self.pool)?)
                .await
                .context("Failed to set blog status")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(status.as_str())
                .bind(now)
                .bind(id)
                .execute(mysql(&self.pool)?)
                .await
                .context("Failed to set blog status")?
                .rows_affected(),
        };
        if affected == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn increment_views(&self, id: i64) -> Result<bool> {
        let sql = "UPDATE blogs SET views = views + 1 WHERE id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(id)
                .execute(sqlite(&self.pool)?)
                .await
                .context("Failed to increment blog views")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(id)
                .execute(mysql(&self.pool)?)
                .await
                .context("Failed to increment blog views")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = "DELETE FROM blogs WHERE id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(id)
                .execute(sqlite(&self.pool)?)
                .await
                .context("Failed to delete blog")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(id)
                .execute(mysql(&self.pool)?)
                .await
                .context("Failed to delete blog")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn count_by_status(&self) -> Result<HashMap<BlogStatus, i64>> {
        let sql = "SELECT status, COUNT(*) AS count FROM blogs GROUP BY status";
        let pairs: Vec<(String, i64)> = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .fetch_all(sqlite(&self.pool)?)
                .await
                .context("Failed to count blogs by status")?
                .iter()
                .map(|row| -> Result<(String, i64)> {
                    Ok((row.try_get("status")?, row.try_get("count")?))
                })
                .collect::<Result<_>>()?,
            DatabaseDriver::Mysql => sqlx::query(sql)
                .fetch_all(mysql(&self.pool)?)
                .await
                .context("Failed to count blogs by status")?
                .iter()
                .map(|row| -> Result<(String, i64)> {
                    Ok((row.try_get("status")?, row.try_get("count")?))
                })
                .collect::<Result<_>>()?,
        };

        let mut counts = HashMap::new();
        for (status, count) in pairs {
            *counts.entry(status.parse::<BlogStatus>()?).or_insert(0) += count;
        }
        Ok(counts)
    }
}

/// Overlay the set fields of `input` onto `existing`
fn merge_update(existing: Blog, input: &UpdateBlogInput, now: DateTime<Utc>) -> Blog {
    Blog {
        title: input.title.clone().unwrap_or(existing.title),
        excerpt: input.excerpt.clone().unwrap_or(existing.excerpt),
        content: input.content.clone().unwrap_or(existing.content),
        content_html: input.content_html.clone().unwrap_or(existing.content_html),
        author: input.author.clone().unwrap_or(existing.author),
        author_email: input.author_email.clone().or(existing.author_email),
        image: input.image.clone().or(existing.image),
        status: input.status.unwrap_or(existing.status),
        updated_at: now,
        ..existing
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_blog_sqlite(pool: &SqlitePool, blog: &Blog, now: DateTime<Utc>) -> Result<i64> {
    let result = sqlx::query(INSERT_BLOG)
        .bind(&blog.title)
        .bind(&blog.excerpt)
        .bind(&blog.content)
        .bind(&blog.content_html)
        .bind(&blog.author)
        .bind(&blog.author_email)
        .bind(&blog.image)
        .bind(blog.status.as_str())
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create blog")?;

    Ok(result.last_insert_rowid())
}

async fn get_blog_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Blog>> {
    let sql = format!("{} WHERE id = ?", SELECT_BLOG);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get blog by ID")?;
    row.as_ref().map(row_to_blog_sqlite).transpose()
}

async fn write_blog_sqlite(pool: &SqlitePool, blog: &Blog) -> Result<()> {
    sqlx::query(UPDATE_BLOG)
        .bind(&blog.title)
        .bind(&blog.excerpt)
        .bind(&blog.content)
        .bind(&blog.content_html)
        .bind(&blog.author)
        .bind(&blog.author_email)
        .bind(&blog.image)
        .bind(blog.status.as_str())
        .bind(blog.updated_at)
        .bind(blog.id)
        .execute(pool)
        .await
        .context("Failed to update blog")?;
    Ok(())
}

fn row_to_blog_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Blog> {
    let status: String = row.try_get("status")?;
    Ok(Blog {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        excerpt: row.try_get("excerpt")?,
        content: row.try_get("content")?,
        content_html: row.try_get("content_html")?,
        author: row.try_get("author")?,
        author_email: row.try_get("author_email")?,
        image: row.try_get("image")?,
        status: status.parse()?,
        views: row.try_get("views")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_blog_mysql(pool: &MySqlPool, blog: &Blog, now: DateTime<Utc>) -> Result<i64> {
    let result = sqlx::query(INSERT_BLOG)
        .bind(&blog.title)
        .bind(&blog.excerpt)
        .bind(&blog.content)
        .bind(&blog.content_html)
        .bind(&blog.author)
        .bind(&blog.author_email)
        .bind(&blog.image)
        .bind(blog.status.as_str())
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create blog")?;

    Ok(result.last_insert_id() as i64)
}

async fn get_blog_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Blog>> {
    let sql = format!("{} WHERE id = ?", SELECT_BLOG);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get blog by ID")?;
    row.as_ref().map(row_to_blog_mysql).transpose()
}

async fn write_blog_mysql(pool: &MySqlPool, blog: &Blog) -> Result<()> {
    sqlx::query(UPDATE_BLOG)
        .bind(&blog.title)
        .bind(&blog.excerpt)
        .bind(&blog.content)
        .bind(&blog.content_html)
        .bind(&blog.author)
        .bind(&blog.author_email)
        .bind(&blog.image)
        .bind(blog.status.as_str())
        .bind(blog.updated_at)
        .bind(blog.id)
        .execute(pool)
        .await
        .context("Failed to update blog")?;
    Ok(())
}

fn row_to_blog_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Blog> {
    let status: String = row.try_get("status")?;
    Ok(Blog {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        excerpt: row.try_get("excerpt")?,
        content: row.try_get("content")?,
        content_html: row.try_get("content_html")?,
        author: row.try_get("author")?,
        author_email: row.try_get("author_email")?,
        image: row.try_get("image")?,
        status: status.parse()?,
        views: row.try_get("views")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
