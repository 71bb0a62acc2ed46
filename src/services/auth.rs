//! Admin authentication service
//!
//! Credential checks, token issuing and the bootstrap admin account.

use crate::db::repositories::AdminRepository;
use crate::models::Admin;
use crate::services::password::{hash_password, verify_password, MIN_PASSWORD_LENGTH};
use crate::services::token::{Claims, TokenCodec, TokenError};
use std::sync::Arc;

/// Error types for authentication operations
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    /// Email or password was empty
    #[error("Missing fields")]
    MissingFields,

    /// Unknown email or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Admin already exists: {0}")]
    AdminExists(String),

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Authentication service
pub struct AuthService {
    admin_repo: Arc<dyn AdminRepository>,
    tokens: TokenCodec,
}

impl AuthService {
    pub fn new(admin_repo: Arc<dyn AdminRepository>, tokens: TokenCodec) -> Self {
        Self { admin_repo, tokens }
    }

    pub fn tokens(&self) -> &TokenCodec {
        &self.tokens
    }

    /// Check credentials and issue a token.
    ///
    /// An unknown email and a wrong password are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<(Admin, String), AuthServiceError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthServiceError::MissingFields);
        }

        let Some(admin) = self.admin_repo.get_by_email(email).await? else {
            tracing::debug!("Login attempt for unknown admin {}", email);
            return Err(AuthServiceError::InvalidCredentials);
        };

        if !verify_password(password, &admin.password_hash)? {
            tracing::debug!("Wrong password for admin {}", admin.id);
            return Err(AuthServiceError::InvalidCredentials);
        }

        let token = self.tokens.issue(&admin);
        tracing::info!("Admin {} logged in", admin.id);
        Ok((admin, token))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthServiceError> {
        Ok(self.tokens.verify(token)?)
    }

    pub async fn get_admin(&self, id: i64) -> Result<Option<Admin>, AuthServiceError> {
        Ok(self.admin_repo.get_by_id(id).await?)
    }

    /// Create an admin account. Used by the seed command.
    pub async fn create_admin(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<Admin, AuthServiceError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthServiceError::MissingFields);
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthServiceError::ValidationError(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        if self.admin_repo.get_by_email(email).await?.is_some() {
            return Err(AuthServiceError::AdminExists(email.to_string()));
        }

        let password_hash = hash_password(password)?;
        let name = name.map(str::trim).filter(|n| !n.is_empty()).map(String::from);
        let admin = self
            .admin_repo
            .create(&Admin::new(email.to_string(), name, password_hash))
            .await?;

        tracing::info!("Created admin {} ({})", admin.id, admin.email);
        Ok(admin)
    }

    /// Create the bootstrap admin if no admin exists yet.
    ///
    /// Returns whether an account was created.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<bool, AuthServiceError> {
        if self.admin_repo.count().await? > 0 {
            return Ok(false);
        }
        self.create_admin(email, password, Some("Admin")).await?;
        Ok(true)
    }
}
