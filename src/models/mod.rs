//! Data models
//!
//! Entities persisted by the repositories (Admin, Blog, Feedback) and the
//! input types used to create and change them.

mod admin;
mod blog;
mod feedback;

pub use admin::Admin;
pub use blog::{Blog, BlogStatus, CreateBlogInput, UpdateBlogInput};
pub use feedback::Feedback;
