//! Blog moderation API endpoints
//!
//! All routes here sit behind `require_auth`:
//! - GET/POST /api/blogs
//! - GET /api/blogs/browse - search + pagination
//! - GET/PUT/DELETE /api/blogs/{id}
//! - PATCH /api/blogs/{id}/approve, PATCH /api/blogs/{id}/reject
//! - GET/POST /api/blogs/{id}/feedback
//! - GET /api/posts - older name for the full list

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedAdmin};
use crate::models::{Blog, BlogStatus, CreateBlogInput, Feedback, UpdateBlogInput};
use crate::services::{BrowseQuery, PageItem, StatusStats};

/// Blog as returned by the API, with the reading-time estimate
#[derive(Debug, Serialize)]
pub struct BlogResponse {
    #[serde(flatten)]
    pub blog: Blog,
    pub read_time: String,
}

impl From<Blog> for BlogResponse {
    fn from(blog: Blog) -> Self {
        let read_time = blog.read_time();
        Self { blog, read_time }
    }
}

/// Request body for creating a blog. Every field is optional so missing
/// ones produce a "Missing fields" error rather than a body rejection.
#[derive(Debug, Default, Deserialize)]
pub struct CreateBlogRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub author_email: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub status: Option<BlogStatus>,
}

impl From<CreateBlogRequest> for CreateBlogInput {
    fn from(req: CreateBlogRequest) -> Self {
        Self {
            title: req.title.unwrap_or_default(),
            content: req.content.unwrap_or_default(),
            excerpt: req.excerpt,
            author: req.author,
            author_email: req.author_email,
            image: req.image,
            status: req.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct BrowseResponse {
    pub blogs: Vec<BlogResponse>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
    pub showing_from: usize,
    pub showing_to: usize,
    pub pages: Vec<PageItem>,
    pub stats: StatusStats,
}

/// Build blog routes (mounted under /api, behind auth)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/blogs", get(list_blogs).post(create_blog))
        .route("/blogs/browse", get(browse_blogs))
        .route(
            "/blogs/{id}",
            get(get_blog).put(update_blog).delete(delete_blog),
        )
        .route("/blogs/{id}/approve", patch(approve_blog))
        .route("/blogs/{id}/reject", patch(reject_blog))
        .route("/blogs/{id}/feedback", get(list_feedback).post(send_feedback))
        .route("/posts", get(list_blogs))
}

/// GET /api/blogs - all blogs, newest first
async fn list_blogs(State(state): State<AppState>) -> Result<Json<Vec<BlogResponse>>, ApiError> {
    let blogs = state.blog_service.list().await?;
    Ok(Json(blogs.into_iter().map(BlogResponse::from).collect()))
}

/// GET /api/blogs/browse?q=&page=&per_page=
async fn browse_blogs(
    State(state): State<AppState>,
    Query(query): Query<BrowseQuery>,
) -> Result<Json<BrowseResponse>, ApiError> {
    let result = state.blog_service.browse(&query).await?;
    let page = result.page.map(BlogResponse::from);

    Ok(Json(BrowseResponse {
        blogs: page.items,
        page: page.page,
        per_page: page.per_page,
        total: page.total,
        total_pages: page.total_pages,
        showing_from: page.showing_from,
        showing_to: page.showing_to,
        pages: result.pages,
        stats: result.stats,
    }))
}

/// POST /api/blogs
async fn create_blog(
    State(state): State<AppState>,
    Json(body): Json<CreateBlogRequest>,
) -> Result<(StatusCode, Json<BlogResponse>), ApiError> {
    let blog = state.blog_service.create(body.into()).await?;
    Ok((StatusCode::CREATED, Json(blog.into())))
}

/// GET /api/blogs/{id} - counts as a view
async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<BlogResponse>, ApiError> {
    let blog = state.blog_service.view(id).await?;
    Ok(Json(blog.into()))
}

/// PUT /api/blogs/{id}
async fn update_blog(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateBlogInput>,
) -> Result<Json<BlogResponse>, ApiError> {
    let blog = state.blog_service.update(id, body).await?;
    Ok(Json(blog.into()))
}

/// DELETE /api/blogs/{id}
async fn delete_blog(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.blog_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/blogs/{id}/approve
async fn approve_blog(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<BlogResponse>, ApiError> {
    let blog = state.blog_service.approve(id).await?;
    Ok(Json(blog.into()))
}

/// PATCH /api/blogs/{id}/reject
async fn reject_blog(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<BlogResponse>, ApiError> {
    let blog = state.blog_service.reject(id).await?;
    Ok(Json(blog.into()))
}

/// POST /api/blogs/{id}/feedback
async fn send_feedback(
    State(state): State<AppState>,
    AuthenticatedAdmin(claims): AuthenticatedAdmin,
    Path(id): Path<i64>,
    Json(body): Json<FeedbackRequest>,
) -> Result<(StatusCode, Json<Feedback>), ApiError> {
    let feedback = state
        .blog_service
        .send_feedback(id, claims.sub, &body.message)
        .await?;
    Ok((StatusCode::CREATED, Json(feedback)))
}

/// GET /api/blogs/{id}/feedback
async fn list_feedback(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Feedback>>, ApiError> {
    Ok(Json(state.blog_service.list_feedback(id).await?))
}
