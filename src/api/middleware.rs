//! API middleware
//!
//! Shared application state, the JSON error type, and token authentication
//! for the protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{AuthConfig, Config};
use crate::db::repositories::{SqlxAdminRepository, SqlxBlogRepository, SqlxFeedbackRepository};
use crate::db::DynDatabasePool;
use crate::services::{
    AuthService, AuthServiceError, BlogService, BlogServiceError, Claims, TokenCodec,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub auth_service: Arc<AuthService>,
    pub blog_service: Arc<BlogService>,
    pub auth_config: Arc<AuthConfig>,
}

impl AppState {
    /// Wire repositories and services over `pool`
    pub fn new(pool: DynDatabasePool, config: &Config) -> Self {
        let tokens = TokenCodec::new(&config.auth.jwt_secret, config.auth.token_ttl_seconds());
        let auth_service = AuthService::new(SqlxAdminRepository::boxed(pool.clone()), tokens);
        let blog_service = BlogService::with_listing(
            SqlxBlogRepository::boxed(pool.clone()),
            SqlxFeedbackRepository::boxed(pool.clone()),
            config.listing.clone(),
        );

        Self {
            pool,
            auth_service: Arc::new(auth_service),
            blog_service: Arc::new(blog_service),
            auth_config: Arc::new(config.auth.clone()),
        }
    }
}

/// Verified token claims of the admin making the request
#[derive(Debug, Clone)]
pub struct AuthenticatedAdmin(pub Claims);

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<BlogServiceError> for ApiError {
    fn from(err: BlogServiceError) -> Self {
        match err {
            BlogServiceError::NotFound => ApiError::not_found("Blog not found"),
            BlogServiceError::MissingFields => ApiError::validation_error("Missing fields"),
            BlogServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            BlogServiceError::InternalError(e) => {
                tracing::error!("Blog operation failed: {:#}", e);
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

impl From<AuthServiceError> for ApiError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::MissingFields => ApiError::validation_error("Missing fields"),
            AuthServiceError::InvalidCredentials => ApiError::unauthorized("Invalid credentials"),
            AuthServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            AuthServiceError::AdminExists(email) => {
                ApiError::conflict(format!("Admin already exists: {}", email))
            }
            AuthServiceError::InvalidToken(_) => {
                ApiError::unauthorized("Unauthorized: Invalid token")
            }
            AuthServiceError::InternalError(e) => {
                tracing::error!("Auth operation failed: {:#}", e);
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

/// Token from `Authorization: Bearer`, falling back to the `cookie_name` cookie
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|s| s.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Authentication middleware
///
/// Rejects requests without a valid token and attaches `AuthenticatedAdmin`
/// to the ones it lets through.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers(), &state.auth_config.cookie_name)
        .ok_or_else(|| ApiError::unauthorized("Unauthorized: No token provided"))?;

    let claims = state.auth_service.verify(&token).map_err(|e| {
        tracing::debug!("Rejected token on {}: {}", request.uri().path(), e);
        ApiError::unauthorized("Unauthorized: Invalid token")
    })?;

    request.extensions_mut().insert(AuthenticatedAdmin(claims));
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthenticatedAdmin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedAdmin>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Unauthorized: No token provided"))
    }
}
