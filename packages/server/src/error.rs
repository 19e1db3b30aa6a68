use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `SESSION_MISSING`,
    /// `SESSION_INVALID`, `INVALID_CREDENTIALS`, `NOT_FOUND`, `SLUG_TAKEN`,
    /// `USERNAME_TAKEN`, `PROTECTED`, `PAYLOAD_TOO_LARGE`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Name must be 1-255 characters")]
    pub message: String,
    /// Name of the offending request field, for field-level form errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "slug")]
    pub field: Option<&'static str>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    /// Validation failure attributable to a single request field.
    InvalidField {
        field: &'static str,
        message: String,
    },
    SessionMissing,
    SessionInvalid,
    InvalidCredentials,
    NotFound(String),
    SlugTaken,
    UsernameTaken,
    /// Delete blocked because other records still reference the target.
    Protected(String),
    PayloadTooLarge(String),
    Internal(String),
}

impl AppError {
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        AppError::InvalidField {
            field,
            message: message.into(),
        }
    }

    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let (status, code, message, field) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg, None),
            AppError::InvalidField { field, message } => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                message,
                Some(field),
            ),
            AppError::SessionMissing => (
                StatusCode::UNAUTHORIZED,
                "SESSION_MISSING",
                "Authentication required".into(),
                None,
            ),
            AppError::SessionInvalid => (
                StatusCode::UNAUTHORIZED,
                "SESSION_INVALID",
                "Invalid or expired session".into(),
                None,
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid username or password".into(),
                None,
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            AppError::SlugTaken => (
                StatusCode::CONFLICT,
                "SLUG_TAKEN",
                "Slug is already in use".into(),
                Some("slug"),
            ),
            AppError::UsernameTaken => (
                StatusCode::CONFLICT,
                "USERNAME_TAKEN",
                "Username is already taken".into(),
                Some("username"),
            ),
            AppError::Protected(msg) => (StatusCode::CONFLICT, "PROTECTED", msg, None),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg, None)
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An unexpected error occurred".into(),
                    None,
                )
            }
        };
        (
            status,
            ErrorBody {
                code,
                message,
                field,
            },
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(path) => AppError::NotFound(format!("Media '{path}' not found")),
            StorageError::InvalidPath(msg) => AppError::Validation(msg),
            StorageError::InvalidFilename(e) => AppError::field("file", e.message()),
            e @ StorageError::SizeLimitExceeded { .. } => AppError::PayloadTooLarge(e.to_string()),
            StorageError::Io(e) => AppError::Internal(format!("Media IO error: {e}")),
        }
    }
}

/// Map a unique-constraint violation on insert/update to `on_conflict`,
/// passing every other database error through as internal.
pub fn unique_violation_or(err: DbErr, on_conflict: AppError) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            tracing::debug!("Unique constraint caught on write: {detail}");
            on_conflict
        }
        _ => AppError::from(err),
    }
}
