//! Authentication API endpoints
//!
//! - POST /api/login - cookie login used by the panel's login form
//! - POST /api/admin/login - token login for API clients
//! - GET /api/auth/verify - report whether the caller's token is valid
//! - POST /api/auth/logout - clear the token cookie
//! - GET /api/auth/me - current admin (protected)

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::middleware::{extract_token, ApiError, AppState, AuthenticatedAdmin};
use crate::models::Admin;
use crate::services::{AuthServiceError, Claims, MIN_PASSWORD_LENGTH};

static EMAIL_PATTERN: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^\S+@\S+\.\S+$"));

/// Request body for both login endpoints
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminResponse {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
}

impl From<Admin> for AdminResponse {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            email: admin.email,
            name: admin.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenLoginResponse {
    pub token: String,
    pub admin: AdminResponse,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Claims>,
}

/// Routes reachable without a token
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(form_login))
        .route("/admin/login", post(admin_login))
        .route("/auth/verify", get(verify))
        .route("/auth/logout", post(logout))
}

/// Routes behind `require_auth`
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

/// Field errors for the login form, keyed by field name
fn validate_login_form(email: &str, password: &str) -> Result<Option<serde_json::Value>, ApiError> {
    let email_pattern = EMAIL_PATTERN
        .as_ref()
        .map_err(|e| ApiError::internal_error(format!("Regex error: {}", e)))?;

    let mut details = serde_json::Map::new();
    if !email_pattern.is_match(email) {
        details.insert("email".to_string(), json!("Invalid email address"));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        details.insert(
            "password".to_string(),
            json!(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )),
        );
    }
    Ok((!details.is_empty()).then_some(serde_json::Value::Object(details)))
}

fn cookie_header(value: &str) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(value)
        .map_err(|_| ApiError::internal_error("Failed to build cookie"))?;
    headers.insert(header::SET_COOKIE, value);
    Ok(headers)
}

/// POST /api/login
///
/// Sets the token as an httpOnly cookie instead of returning it.
async fn form_login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = body.email.unwrap_or_default();
    let password = body.password.unwrap_or_default();

    if let Some(details) = validate_login_form(email.trim(), &password)? {
        return Err(ApiError::with_details(
            "VALIDATION_ERROR",
            "Invalid input",
            details,
        ));
    }

    let (_, token) = state
        .auth_service
        .login(&email, &password)
        .await
        .map_err(|e| match e {
            AuthServiceError::InvalidCredentials | AuthServiceError::MissingFields => {
                ApiError::unauthorized("Invalid email or password")
            }
            other => other.into(),
        })?;

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        state.auth_config.cookie_name,
        token,
        state.auth_service.tokens().ttl_seconds()
    );

    Ok((
        cookie_header(&cookie)?,
        Json(json!({ "message": "Login successful!" })),
    ))
}

/// POST /api/admin/login
async fn admin_login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenLoginResponse>, ApiError> {
    let email = body.email.unwrap_or_default();
    let password = body.password.unwrap_or_default();

    let (admin, token) = state.auth_service.login(&email, &password).await?;

    Ok(Json(TokenLoginResponse {
        token,
        admin: admin.into(),
    }))
}

/// GET /api/auth/verify
///
/// Always 200; the body says whether the token checked out.
async fn verify(State(state): State<AppState>, headers: HeaderMap) -> Json<VerifyResponse> {
    let claims = extract_token(&headers, &state.auth_config.cookie_name)
        .and_then(|token| state.auth_service.verify(&token).ok());

    Json(VerifyResponse {
        valid: claims.is_some(),
        user: claims,
    })
}

/// POST /api/auth/logout
async fn logout(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        state.auth_config.cookie_name
    );
    Ok((StatusCode::NO_CONTENT, cookie_header(&cookie)?))
}

/// GET /api/auth/me
async fn me(
    State(state): State<AppState>,
    AuthenticatedAdmin(claims): AuthenticatedAdmin,
) -> Result<Json<AdminResponse>, ApiError> {
    let admin = state
        .auth_service
        .get_admin(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Unauthorized: Invalid token"))?;
    Ok(Json(admin.into()))
}
