//! Services layer - Business logic
//!
//! Services sit between the HTTP handlers and the repositories. They own
//! validation, token handling and the moderation list algorithm.

pub mod auth;
pub mod blog;
pub mod listing;
pub mod markdown;
pub mod password;
pub mod token;

pub use auth::{AuthService, AuthServiceError};
pub use blog::{derive_excerpt, BlogService, BlogServiceError, BrowseQuery, BrowseResult};
pub use listing::{page_window, paginate, Page, PageItem, StatusStats};
pub use markdown::{plain_text, render_markdown};
pub use password::{hash_password, verify_password, MIN_PASSWORD_LENGTH};
pub use token::{Claims, TokenCodec, TokenError};
