//! Client side of the external user service.
//!
//! The ledger never stores users; balances, statuses and credentials are read
//! and written through [`UserDirectory`].

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::Secret;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{User, UserStatus, UserUpdate};

pub mod http;
pub mod memory;

pub use http::HttpUserDirectory;
pub use memory::InMemoryUserDirectory;

#[derive(thiserror::Error, Debug)]
pub enum UserDirectoryError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("User service error: {status} - {message}")]
    ApiError { status: StatusCode, message: String },

    #[error("User service unavailable: {0}")]
    Unavailable(String),

    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Invalid email or password")]
    InvalidCredentials,
}

impl From<UserDirectoryError> for AppError {
    fn from(err: UserDirectoryError) -> Self {
        match err {
            UserDirectoryError::HttpError(e) => AppError::CollaboratorUnavailable(e.to_string()),
            UserDirectoryError::Unavailable(msg) => AppError::CollaboratorUnavailable(msg),
            UserDirectoryError::ApiError { status, message } if status.is_server_error() => {
                AppError::CollaboratorUnavailable(format!("{}: {}", status, message))
            }
            UserDirectoryError::ApiError {
                status: StatusCode::NOT_FOUND,
                message,
            } => AppError::NotFound(message),
            UserDirectoryError::ApiError { message, .. } => AppError::Validation(message),
            UserDirectoryError::UserNotFound(id) => AppError::NotFound(format!("user {}", id)),
            UserDirectoryError::InvalidCredentials => {
                AppError::Validation("Invalid email or password".to_string())
            }
        }
    }
}

/// Result of a successful login against the user service
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub access_token: Secret<String>,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn authenticate(&self, email: &str, password: &str)
        -> Result<AuthSession, UserDirectoryError>;

    async fn get_user(&self, user_id: Uuid) -> Result<User, UserDirectoryError>;

    async fn list_users(&self) -> Result<Vec<User>, UserDirectoryError>;

    async fn update_user(&self, user_id: Uuid, update: UserUpdate)
        -> Result<User, UserDirectoryError>;

    /// Credits (or debits, when negative) a user's own balance
    async fn add_points(
        &self,
        user_id: Uuid,
        amount: i64,
        reason: &str,
    ) -> Result<User, UserDirectoryError>;

    /// Admin balance correction
    async fn adjust_points(
        &self,
        user_id: Uuid,
        amount: i64,
        reason: &str,
    ) -> Result<User, UserDirectoryError>;

    async fn set_status(&self, user_id: Uuid, status: UserStatus)
        -> Result<User, UserDirectoryError>;

    async fn check_health(&self) -> Result<(), UserDirectoryError>;
}
