//! Admin model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An account allowed into the moderation panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub id: i64,
    /// Login email (unique)
    pub email: String,
    /// Display name
    pub name: Option<String>,
    /// Argon2id PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Admin {
    /// Build an admin that has not been stored yet.
    ///
    /// The password must already be hashed, see `services::password::hash_password`.
    pub fn new(email: String, name: Option<String>, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            email,
            name,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}
