use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::db::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid transition: {entity} cannot move from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("Insufficient balance: {required} points required, {available} available")]
    InsufficientBalance { required: i64, available: i64 },

    #[error("User service unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable error code returned to API callers
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidState(_) => "INVALID_STATE",
            AppError::InvalidTransition { .. } => "INVALID_TRANSITION",
            AppError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            AppError::CollaboratorUnavailable(_) => "COLLABORATOR_UNAVAILABLE",
            AppError::Store(_) => "STORE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidState(_) | AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::InsufficientBalance { .. } => StatusCode::PAYMENT_REQUIRED,
            AppError::CollaboratorUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            AppError::Store(e) => {
                tracing::error!(error = %e, "Store failure");
                "Store error".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!(error = ?e, "Internal failure");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": self.code(),
            "message": message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_statuses() {
        let err = AppError::InvalidTransition {
            entity: "swap request",
            from: "accepted".to_string(),
            to: "rejected".to_string(),
        };
        assert_eq!(err.code(), "INVALID_TRANSITION");
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err = AppError::InsufficientBalance {
            required: 45,
            available: 10,
        };
        assert_eq!(err.code(), "INSUFFICIENT_BALANCE");
        assert_eq!(err.status_code(), StatusCode::PAYMENT_REQUIRED);

        let err = AppError::CollaboratorUnavailable("timeout".to_string());
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_store_error_converts() {
        let err: AppError = StoreError::Poisoned.into();
        assert_eq!(err.code(), "STORE_ERROR");
    }
}
