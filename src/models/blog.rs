//! Blog model
//!
//! This module provides:
//! - `Blog` entity, a submitted post awaiting or past moderation
//! - `BlogStatus` enum for moderation states
//! - Input types for creating and updating blogs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reading speed used for the "n min read" estimate
const WORDS_PER_MINUTE: usize = 200;

/// Blog entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blog {
    pub id: i64,
    pub title: String,
    /// Short summary shown in list views
    pub excerpt: String,
    /// Markdown content
    pub content: String,
    /// Rendered HTML content
    pub content_html: String,
    /// Author display name
    pub author: String,
    /// Where moderator feedback is addressed
    pub author_email: Option<String>,
    /// Cover image URL
    pub image: Option<String>,
    pub status: BlogStatus,
    /// Number of times the detail view was opened
    #[serde(default)]
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Blog {
    /// Estimated reading time in whole minutes (at least one)
    pub fn read_minutes(&self) -> usize {
        let words = self.content.split_whitespace().count();
        words.div_ceil(WORDS_PER_MINUTE).max(1)
    }

    /// Human-readable reading time, e.g. "5 min read"
    pub fn read_time(&self) -> String {
        format!("{} min read", self.read_minutes())
    }
}

/// Moderation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BlogStatus {
    /// Submitted, waiting for a moderator
    #[default]
    #[serde(alias = "draft")]
    Pending,
    /// Accepted for publication
    #[serde(alias = "published")]
    Approved,
    /// Turned down by a moderator
    Rejected,
}

impl BlogStatus {
    pub const ALL: [BlogStatus; 3] = [BlogStatus::Pending, BlogStatus::Approved, BlogStatus::Rejected];

    /// Database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            BlogStatus::Pending => "pending",
            BlogStatus::Approved => "approved",
            BlogStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for BlogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlogStatus {
    type Err = anyhow::Error;

    /// Accepts the stored names plus the `draft`/`published` wording used by
    /// older clients.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" | "draft" => Ok(BlogStatus::Pending),
            "approved" | "published" => Ok(BlogStatus::Approved),
            "rejected" => Ok(BlogStatus::Rejected),
            _ => Err(anyhow::anyhow!("Invalid blog status: {}", s)),
        }
    }
}

/// Input for creating a new blog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateBlogInput {
    pub title: String,
    pub content: String,
    /// Derived from the content when absent or blank
    #[serde(default)]
    pub excerpt: Option<String>,
    /// Defaults to "Anonymous"
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub author_email: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    /// Defaults to pending
    #[serde(default)]
    pub status: Option<BlogStatus>,
}

impl CreateBlogInput {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>, email: Option<String>) -> Self {
        self.author = Some(author.into());
        self.author_email = email;
        self
    }

    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = Some(excerpt.into());
        self
    }

    pub fn with_status(mut self, status: BlogStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Partial update of an existing blog. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBlogInput {
    pub title: Option<String>,
    pub content: Option<String>,
    /// Set by the service whenever `content` changes
    #[serde(skip)]
    pub content_html: Option<String>,
    pub excerpt: Option<String>,
    pub author: Option<String>,
    pub author_email: Option<String>,
    pub image: Option<String>,
    pub status: Option<BlogStatus>,
}

impl UpdateBlogInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_status(mut self, status: BlogStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.content.is_some()
            || self.excerpt.is_some()
            || self.author.is_some()
            || self.author_email.is_some()
            || self.image.is_some()
            || self.status.is_some()
    }
}
