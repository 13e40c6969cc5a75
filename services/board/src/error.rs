//! Custom error types for the board service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the board service
///
/// Every variant renders as a JSON body `{"message": ...}`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// A verification or upgrade code did not match
    #[error("{0}")]
    InvalidCode(String),

    /// Bad credentials or missing/invalid session
    #[error("{0}")]
    Auth(String),

    /// Valid session without the required access level
    #[error("{0}")]
    Forbidden(String),

    /// The referenced record does not exist
    #[error("{0}")]
    NotFound(String),

    /// The record already satisfies the request
    #[error("{0}")]
    Conflict(String),

    /// The verification email could not be sent
    #[error("{0}")]
    Delivery(String),

    /// Unexpected failure in the store, hasher or token codec
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidCode(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Delivery(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Internal(e) => {
                error!("Internal error: {:#}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Type alias for results in the board service
pub type AppResult<T> = Result<T, AppError>;
