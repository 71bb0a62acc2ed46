//! Blog moderation service
//!
//! Business rules for submitted blogs:
//! - validation of title, content and feedback messages
//! - excerpt derivation and Markdown rendering on every write
//! - approve / reject transitions
//! - the searchable, paginated moderation list

use crate::config::ListingConfig;
use crate::db::repositories::{BlogRepository, FeedbackRepository};
use crate::models::{Blog, BlogStatus, CreateBlogInput, Feedback, UpdateBlogInput};
use crate::services::listing::{self, Page, PageItem, StatusStats};
use crate::services::markdown::{plain_text, render_markdown};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

/// Longest accepted title, in characters
pub const MAX_TITLE_LENGTH: usize = 200;

/// Column widths for the author fields and cover image URL
pub const MAX_AUTHOR_LENGTH: usize = 100;
pub const MAX_AUTHOR_EMAIL_LENGTH: usize = 255;
pub const MAX_IMAGE_LENGTH: usize = 500;

/// Longest accepted feedback message, in characters
pub const MAX_FEEDBACK_LENGTH: usize = 2000;

/// Length of a derived excerpt before the ellipsis
pub const EXCERPT_LENGTH: usize = 160;

/// Upper bound on a client-requested page size
pub const MAX_PER_PAGE: usize = 100;

const DEFAULT_AUTHOR: &str = "Anonymous";

/// Error types for blog service operations
#[derive(Debug, thiserror::Error)]
pub enum BlogServiceError {
    #[error("Blog not found")]
    NotFound,

    /// Title or content absent on create
    #[error("Missing fields")]
    MissingFields,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Query for the moderation list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrowseQuery {
    /// Search term, matched against title, excerpt and status
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub per_page: Option<usize>,
}

/// One page of the moderation list plus what a pagination bar needs
#[derive(Debug, Clone)]
pub struct BrowseResult {
    pub page: Page<Blog>,
    pub pages: Vec<PageItem>,
    /// Counts over all blogs, ignoring the search term
    pub stats: StatusStats,
}

/// Blog service
pub struct BlogService {
    blog_repo: Arc<dyn BlogRepository>,
    feedback_repo: Arc<dyn FeedbackRepository>,
    listing: ListingConfig,
}

impl BlogService {
    pub fn new(
        blog_repo: Arc<dyn BlogRepository>,
        feedback_repo: Arc<dyn FeedbackRepository>,
    ) -> Self {
        Self::with_listing(blog_repo, feedback_repo, ListingConfig::default())
    }

    pub fn with_listing(
        blog_repo: Arc<dyn BlogRepository>,
        feedback_repo: Arc<dyn FeedbackRepository>,
        listing: ListingConfig,
    ) -> Self {
        Self {
            blog_repo,
            feedback_repo,
            listing,
        }
    }

    /// All blogs, newest first
    pub async fn list(&self) -> Result<Vec<Blog>, BlogServiceError> {
        Ok(self.blog_repo.list_all().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Blog, BlogServiceError> {
        self.blog_repo
            .get_by_id(id)
            .await?
            .ok_or(BlogServiceError::NotFound)
    }

    /// Fetch a blog for display, counting the view
    pub async fn view(&self, id: i64) -> Result<Blog, BlogServiceError> {
        let mut blog = self.get(id).await?;
        if self.blog_repo.increment_views(id).await? {
            blog.views += 1;
        }
        Ok(blog)
    }

    pub async fn create(&self, input: CreateBlogInput) -> Result<Blog, BlogServiceError> {
        let title = input.title.trim();
        let content = input.content.trim();
        if title.is_empty() || content.is_empty() {
            return Err(BlogServiceError::MissingFields);
        }
        validate_title(title)?;

        let excerpt = match non_blank(input.excerpt) {
            Some(excerpt) => excerpt,
            None => derive_excerpt(content),
        };
        let now = Utc::now();
        let blog = Blog {
            id: 0,
            title: title.to_string(),
            excerpt,
            content: content.to_string(),
            content_html: render_markdown(content),
            author: non_blank(input.author).unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            author_email: non_blank(input.author_email),
            image: non_blank(input.image),
            status: input.status.unwrap_or_default(),
            views: 0,
            created_at: now,
            updated_at: now,
        };
        validate_author_fields(
            Some(&blog.author),
            blog.author_email.as_deref(),
            blog.image.as_deref(),
        )?;

        let created = self.blog_repo.create(&blog).await?;
        tracing::info!("Blog {} submitted by {}", created.id, created.author);
        Ok(created)
    }

    /// Apply the fields present in `input`.
    ///
    /// A blank excerpt is re-derived from the (possibly new) content.
    pub async fn update(
        &self,
        id: i64,
        mut input: UpdateBlogInput,
    ) -> Result<Blog, BlogServiceError> {
        let existing = self.get(id).await?;
        if !input.has_changes() {
            return Ok(existing);
        }

        if let Some(title) = input.title.as_mut() {
            *title = title.trim().to_string();
            if title.is_empty() {
                return Err(BlogServiceError::ValidationError(
                    "Title cannot be empty".to_string(),
                ));
            }
            validate_title(title)?;
        }
        if let Some(content) = input.content.as_mut() {
            *content = content.trim().to_string();
            if content.is_empty() {
                return Err(BlogServiceError::ValidationError(
                    "Content cannot be empty".to_string(),
                ));
            }
            input.content_html = Some(render_markdown(content));
        }
        if let Some(excerpt) = input.excerpt.as_mut() {
            if excerpt.trim().is_empty() {
                let content = input.content.as_deref().unwrap_or(&existing.content);
                *excerpt = derive_excerpt(content);
            }
        }
        if let Some(author) = input.author.as_mut() {
            if author.trim().is_empty() {
                *author = DEFAULT_AUTHOR.to_string();
            }
        }
        validate_author_fields(
            input.author.as_deref(),
            input.author_email.as_deref(),
            input.image.as_deref(),
        )?;

        let updated = self
            .blog_repo
            .update(id, &input)
            .await?
            .ok_or(BlogServiceError::NotFound)?;
        tracing::info!("Blog {} updated", id);
        Ok(updated)
    }

    pub async fn approve(&self, id: i64) -> Result<Blog, BlogServiceError> {
        self.set_status(id, BlogStatus::Approved).await
    }

    pub async fn reject(&self, id: i64) -> Result<Blog, BlogServiceError> {
        self.set_status(id, BlogStatus::Rejected).await
    }

    async fn set_status(&self, id: i64, status: BlogStatus) -> Result<Blog, BlogServiceError> {
        let blog = self
            .blog_repo
            .set_status(id, status)
            .await?
            .ok_or(BlogServiceError::NotFound)?;
        tracing::info!("Blog {} marked {}", id, status);
        Ok(blog)
    }

    pub async fn delete(&self, id: i64) -> Result<(), BlogServiceError> {
        if !self.blog_repo.delete(id).await? {
            return Err(BlogServiceError::NotFound);
        }
        tracing::info!("Blog {} deleted", id);
        Ok(())
    }

    /// Search and paginate the moderation list.
    pub async fn browse(&self, query: &BrowseQuery) -> Result<BrowseResult, BlogServiceError> {
        let blogs = self.blog_repo.list_all().await?;
        let stats = StatusStats::from_counts(&self.blog_repo.count_by_status().await?);

        let term = query.q.as_deref().unwrap_or_default();
        let filtered = listing::filter(blogs, term);

        let per_page = query
            .per_page
            .unwrap_or(self.listing.per_page)
            .clamp(1, MAX_PER_PAGE);
        let page = listing::paginate(filtered, query.page.unwrap_or(1), per_page);
        let pages = listing::page_window(page.page, page.total_pages, self.listing.max_visible_pages);

        Ok(BrowseResult { page, pages, stats })
    }

    /// Record a moderator note for the author of `blog_id`.
    pub async fn send_feedback(
        &self,
        blog_id: i64,
        admin_id: i64,
        message: &str,
    ) -> Result<Feedback, BlogServiceError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(BlogServiceError::ValidationError(
                "Feedback message cannot be empty".to_string(),
            ));
        }
        if message.chars().count() > MAX_FEEDBACK_LENGTH {
            return Err(BlogServiceError::ValidationError(format!(
                "Feedback message cannot exceed {} characters",
                MAX_FEEDBACK_LENGTH
            )));
        }

        let blog = self.get(blog_id).await?;
        let feedback = self.feedback_repo.create(blog.id, admin_id, message).await?;
        tracing::info!(
            "Feedback {} on blog {} for {}",
            feedback.id,
            blog.id,
            blog.author_email.as_deref().unwrap_or(&blog.author)
        );
        Ok(feedback)
    }

    pub async fn list_feedback(&self, blog_id: i64) -> Result<Vec<Feedback>, BlogServiceError> {
        self.get(blog_id).await?;
        Ok(self.feedback_repo.list_by_blog(blog_id).await?)
    }
}

fn validate_title(title: &str) -> Result<(), BlogServiceError> {
    validate_length("Title", title, MAX_TITLE_LENGTH)
}

fn validate_author_fields(
    author: Option<&str>,
    author_email: Option<&str>,
    image: Option<&str>,
) -> Result<(), BlogServiceError> {
    if let Some(author) = author {
        validate_length("Author", author, MAX_AUTHOR_LENGTH)?;
    }
    if let Some(email) = author_email {
        validate_length("Author email", email, MAX_AUTHOR_EMAIL_LENGTH)?;
    }
    if let Some(image) = image {
        validate_length("Image URL", image, MAX_IMAGE_LENGTH)?;
    }
    Ok(())
}

fn validate_length(field: &str, value: &str, max: usize) -> Result<(), BlogServiceError> {
    if value.chars().count() > max {
        return Err(BlogServiceError::ValidationError(format!(
            "{} cannot exceed {} characters",
            field, max
        )));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Summary of Markdown `content` for list views.
///
/// Text up to `EXCERPT_LENGTH` characters is kept whole. Longer text is cut at
/// the last word boundary inside the limit and gets `...` appended.
pub fn derive_excerpt(content: &str) -> String {
    let text = plain_text(content);
    if text.chars().count() <= EXCERPT_LENGTH {
        return text;
    }

    let cut: String = text.chars().take(EXCERPT_LENGTH).collect();
    let next_is_boundary = text
        .chars()
        .nth(EXCERPT_LENGTH)
        .is_some_and(char::is_whitespace);
    let head = if next_is_boundary {
        cut.as_str()
    } else {
        match cut.rfind(char::is_whitespace) {
            Some(idx) => &cut[..idx],
            None => cut.as_str(),
        }
    };
    format!("{}...", head.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        AdminRepository, SqlxAdminRepository, SqlxBlogRepository, SqlxFeedbackRepository,
    };
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::Admin;

    async fn setup() -> (DynDatabasePool, BlogService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let service = BlogService::new(
            SqlxBlogRepository::boxed(pool.clone()),
            SqlxFeedbackRepository::boxed(pool.clone()),
        );
        (pool, service)
    }

    async fn seed_admin(pool: &DynDatabasePool) -> i64 {
        SqlxAdminRepository::new(pool.clone())
            .create(&Admin::new("mod@example.com".to_string(), None, "hash".to_string()))
            .await
            .unwrap()
            .id
    }

    #[test]
    fn test_derive_excerpt_short_content_kept_whole() {
        assert_eq!(derive_excerpt("Just a **short** post."), "Just a short post.");
    }

    #[test]
    fn test_derive_excerpt_cuts_on_word_boundary() {
        let content = "word ".repeat(60);
        let excerpt = derive_excerpt(&content);

        assert!(excerpt.ends_with("..."));
        let body = excerpt.trim_end_matches("...");
        assert!(body.chars().count() <= EXCERPT_LENGTH);
        assert!(body.split(' ').all(|w| w == "word"));
    }

    #[test]
    fn test_derive_excerpt_single_long_word() {
        let content = "x".repeat(400);
        let excerpt = derive_excerpt(&content);
        assert_eq!(excerpt.chars().count(), EXCERPT_LENGTH + 3);
    }

    #[tokio::test]
    async fn test_create_applies_defaults() {
        let (_pool, service) = setup().await;

        let blog = service
            .create(CreateBlogInput::new("  Hello  ", "# Intro\n\nSome *text*."))
            .await
            .unwrap();

        assert!(blog.id > 0);
        assert_eq!(blog.title, "Hello");
        assert_eq!(blog.author, "Anonymous");
        assert_eq!(blog.status, BlogStatus::Pending);
        assert_eq!(blog.excerpt, "Intro Some text.");
        assert!(blog.content_html.contains("<h1>Intro</h1>"));
        assert!(blog.author_email.is_none());
    }

    #[tokio::test]
    async fn test_create_keeps_given_fields() {
        let (_pool, service) = setup().await;

        let input = CreateBlogInput::new("Title", "Body")
            .with_author("Jane", Some("jane@example.com".to_string()))
            .with_excerpt("Custom excerpt")
            .with_status(BlogStatus::Approved);
        let blog = service.create(input).await.unwrap();

        assert_eq!(blog.author, "Jane");
        assert_eq!(blog.author_email.as_deref(), Some("jane@example.com"));
        assert_eq!(blog.excerpt, "Custom excerpt");
        assert_eq!(blog.status, BlogStatus::Approved);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let (_pool, service) = setup().await;

        let missing = service.create(CreateBlogInput::new("", "Body")).await;
        assert!(matches!(missing, Err(BlogServiceError::MissingFields)));

        let missing = service.create(CreateBlogInput::new("Title", "   ")).await;
        assert!(matches!(missing, Err(BlogServiceError::MissingFields)));

        let long = service.create(CreateBlogInput::new("t".repeat(201), "Body")).await;
        assert!(matches!(long, Err(BlogServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_author_fields_bounded_by_column_width() {
        let (_pool, service) = setup().await;

        let long_author = service
            .create(CreateBlogInput::new("T", "C").with_author("a".repeat(101), None))
            .await;
        match long_author {
            Err(BlogServiceError::ValidationError(msg)) => {
                assert_eq!(msg, "Author cannot exceed 100 characters")
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        let long_email = service
            .create(CreateBlogInput::new("T", "C").with_author("Jane", Some("e".repeat(256))))
            .await;
        assert!(matches!(long_email, Err(BlogServiceError::ValidationError(_))));

        let blog = service
            .create(CreateBlogInput::new("T", "C").with_author("a".repeat(100), None))
            .await
            .unwrap();
        assert_eq!(blog.author.len(), 100);

        let input = UpdateBlogInput {
            author: Some("b".repeat(101)),
            ..UpdateBlogInput::new()
        };
        let updated = service.update(blog.id, input).await;
        assert!(matches!(updated, Err(BlogServiceError::ValidationError(_))));

        let input = UpdateBlogInput {
            image: Some(format!("https://img.example.com/{}", "x".repeat(500))),
            ..UpdateBlogInput::new().with_status(BlogStatus::Approved)
        };
        let updated = service.update(blog.id, input).await;
        assert!(matches!(updated, Err(BlogServiceError::ValidationError(_))));
        assert_eq!(service.get(blog.id).await.unwrap().status, BlogStatus::Pending);
    }

    #[tokio::test]
    async fn test_view_counts() {
        let (_pool, service) = setup().await;
        let blog = service.create(CreateBlogInput::new("T", "C")).await.unwrap();

        assert_eq!(service.view(blog.id).await.unwrap().views, 1);
        assert_eq!(service.view(blog.id).await.unwrap().views, 2);
        assert_eq!(service.get(blog.id).await.unwrap().views, 2);
        assert!(matches!(service.view(blog.id + 1).await, Err(BlogServiceError::NotFound)));
    }

    #[tokio::test]
    async fn test_update_rerenders_content() {
        let (_pool, service) = setup().await;
        let blog = service.create(CreateBlogInput::new("T", "old")).await.unwrap();

        let updated = service
            .update(blog.id, UpdateBlogInput::new().with_content("**new**"))
            .await
            .unwrap();

        assert_eq!(updated.content, "**new**");
        assert!(updated.content_html.contains("<strong>new</strong>"));
        assert_eq!(updated.title, "T");
        assert_eq!(updated.excerpt, "old");
    }

    #[tokio::test]
    async fn test_update_blank_excerpt_is_rederived() {
        let (_pool, service) = setup().await;
        let blog = service
            .create(CreateBlogInput::new("T", "body").with_excerpt("custom"))
            .await
            .unwrap();

        let input = UpdateBlogInput {
            excerpt: Some(String::new()),
            ..UpdateBlogInput::new().with_content("fresh body")
        };
        let updated = service.update(blog.id, input).await.unwrap();
        assert_eq!(updated.excerpt, "fresh body");
    }

    #[tokio::test]
    async fn test_update_validation_and_not_found() {
        let (_pool, service) = setup().await;
        let blog = service.create(CreateBlogInput::new("T", "C")).await.unwrap();

        let blank = service
            .update(blog.id, UpdateBlogInput::new().with_title("  "))
            .await;
        assert!(matches!(blank, Err(BlogServiceError::ValidationError(_))));

        let missing = service
            .update(blog.id + 10, UpdateBlogInput::new().with_title("x"))
            .await;
        assert!(matches!(missing, Err(BlogServiceError::NotFound)));
    }

    #[tokio::test]
    async fn test_approve_reject_and_delete() {
        let (_pool, service) = setup().await;
        let blog = service.create(CreateBlogInput::new("T", "C")).await.unwrap();

        assert_eq!(service.approve(blog.id).await.unwrap().status, BlogStatus::Approved);
        assert_eq!(service.reject(blog.id).await.unwrap().status, BlogStatus::Rejected);
        assert!(matches!(service.approve(999).await, Err(BlogServiceError::NotFound)));

        service.delete(blog.id).await.unwrap();
        assert!(matches!(service.delete(blog.id).await, Err(BlogServiceError::NotFound)));
        assert!(matches!(service.get(blog.id).await, Err(BlogServiceError::NotFound)));
    }

    #[tokio::test]
    async fn test_browse_filters_and_paginates() {
        let (_pool, service) = setup().await;
        for i in 1..=8 {
            service
                .create(CreateBlogInput::new(format!("Rust tip {}", i), "content"))
                .await
                .unwrap();
        }
        let other = service
            .create(CreateBlogInput::new("Gardening", "soil"))
            .await
            .unwrap();
        service.approve(other.id).await.unwrap();

        let all = service.browse(&BrowseQuery::default()).await.unwrap();
        assert_eq!(all.page.total, 9);
        assert_eq!(all.page.per_page, 6);
        assert_eq!(all.page.items.len(), 6);
        assert_eq!(all.page.items[0].title, "Gardening");
        assert_eq!(all.pages, vec![PageItem::Number(1), PageItem::Number(2)]);

        let query = BrowseQuery {
            q: Some("RUST".to_string()),
            page: Some(2),
            per_page: None,
        };
        let rust = service.browse(&query).await.unwrap();
        assert_eq!(rust.page.total, 8);
        assert_eq!(rust.page.page, 2);
        assert_eq!(rust.page.items.len(), 2);
        assert_eq!((rust.page.showing_from, rust.page.showing_to), (7, 8));

        assert_eq!(rust.stats.total, 9);
        assert_eq!(rust.stats.pending, 8);
        assert_eq!(rust.stats.approved, 1);
    }

    #[tokio::test]
    async fn test_browse_by_status_and_page_size_cap() {
        let (_pool, service) = setup().await;
        let a = service.create(CreateBlogInput::new("A", "x")).await.unwrap();
        service.create(CreateBlogInput::new("B", "x")).await.unwrap();
        service.reject(a.id).await.unwrap();

        let query = BrowseQuery {
            q: Some("rejected".to_string()),
            page: None,
            per_page: Some(10_000),
        };
        let result = service.browse(&query).await.unwrap();
        assert_eq!(result.page.per_page, MAX_PER_PAGE);
        assert_eq!(result.page.items.len(), 1);
        assert_eq!(result.page.items[0].id, a.id);
    }

    #[tokio::test]
    async fn test_feedback_flow() {
        let (pool, service) = setup().await;
        let admin_id = seed_admin(&pool).await;
        let blog = service.create(CreateBlogInput::new("T", "C")).await.unwrap();

        let feedback = service
            .send_feedback(blog.id, admin_id, "  Please add sources  ")
            .await
            .unwrap();
        assert_eq!(feedback.message, "Please add sources");

        let list = service.list_feedback(blog.id).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].admin_id, admin_id);

        let blank = service.send_feedback(blog.id, admin_id, "   ").await;
        assert!(matches!(blank, Err(BlogServiceError::ValidationError(_))));

        let long = service
            .send_feedback(blog.id, admin_id, &"a".repeat(MAX_FEEDBACK_LENGTH + 1))
            .await;
        assert!(matches!(long, Err(BlogServiceError::ValidationError(_))));

        let missing = service.send_feedback(blog.id + 5, admin_id, "hi").await;
        assert!(matches!(missing, Err(BlogServiceError::NotFound)));
        assert!(matches!(
            service.list_feedback(blog.id + 5).await,
            Err(BlogServiceError::NotFound)
        ));
    }
}
