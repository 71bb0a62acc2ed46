//! Moderator feedback sent to a blog's author

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: i64,
    pub blog_id: i64,
    /// Admin who wrote the note
    pub admin_id: i64,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
