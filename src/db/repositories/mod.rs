//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the queries for a single table.

pub mod admin;
pub mod blog;
pub mod feedback;

pub use admin::{AdminRepository, SqlxAdminRepository};
pub use blog::{BlogRepository, SqlxBlogRepository};
pub use feedback::{FeedbackRepository, SqlxFeedbackRepository};
