//! Error types for the HTTP API.
//!
//! Every failure leaves the server as `{ "code", "message" }` with a stable
//! machine-readable `code`. Storage failures are logged in full and reported
//! to the client without detail.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

use bazaar_core::{CoreError, StockShortfall, ValidationError};
use bazaar_db::{DbError, StoreError};

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        ApiError::Store(StoreError::Core(error))
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        ApiError::Store(StoreError::Core(CoreError::Validation(error)))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortfalls: Option<Vec<StockShortfall>>,
}

impl ErrorBody {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        ErrorBody {
            code,
            message: message.into(),
            shortfalls: None,
        }
    }
}

fn core_error_response(error: CoreError) -> (StatusCode, ErrorBody) {
    let message = error.to_string();
    match error {
        CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, ErrorBody::new("NOT_FOUND", message)),
        CoreError::Validation(_) => (
            StatusCode::BAD_REQUEST,
            ErrorBody::new("VALIDATION_ERROR", message),
        ),
        CoreError::Forbidden { .. } => {
            (StatusCode::FORBIDDEN, ErrorBody::new("FORBIDDEN", message))
        }
        CoreError::InsufficientStock { shortfalls } => (
            StatusCode::CONFLICT,
            ErrorBody {
                code: "INSUFFICIENT_STOCK",
                message,
                shortfalls: Some(shortfalls),
            },
        ),
        CoreError::Conflict { .. } => (StatusCode::CONFLICT, ErrorBody::new("CONFLICT", message)),
        CoreError::InvalidStatusTransition { .. } => (
            StatusCode::CONFLICT,
            ErrorBody::new("INVALID_TRANSITION", message),
        ),
    }
}

fn db_error_response(error: DbError) -> (StatusCode, ErrorBody) {
    match error {
        DbError::NotFound { .. } => (
            StatusCode::NOT_FOUND,
            ErrorBody::new("NOT_FOUND", error.to_string()),
        ),
        DbError::UniqueViolation { .. } => {
            warn!(error = %error, "Unique constraint rejected a write");
            (
                StatusCode::CONFLICT,
                ErrorBody::new("CONFLICT", "The resource already exists"),
            )
        }
        DbError::PoolExhausted => (
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorBody::new("DATABASE_ERROR", "Service temporarily unavailable"),
        ),
        other => {
            error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("DATABASE_ERROR", "A database error occurred"),
            )
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Store(StoreError::Core(e)) => core_error_response(e),
            ApiError::Store(StoreError::Db(e)) => db_error_response(e),
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorBody::new("UNAUTHORIZED", msg))
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, ErrorBody::new("FORBIDDEN", msg)),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("VALIDATION_ERROR", msg),
            ),
            ApiError::Internal(msg) => {
                error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("INTERNAL", "Internal server error"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
