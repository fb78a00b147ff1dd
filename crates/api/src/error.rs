//! The error type every pulseboard handler returns.
//!
//! Failures render as `{"error": <message>, "code": <CODE>}`. Anything that
//! maps to a 500 is logged here and the client only sees [`MSG_INTERNAL`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pulseboard_core::error::CoreError;
use serde_json::json;

pub const MSG_INTERNAL: &str = "An internal error occurred";
pub const MSG_RATE_LIMITED: &str = "Too many requests, please try again later";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Malformed query or body that validation did not catch.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    /// Hashing, signing, or serialization failures. Logged, never shown.
    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn unauthorized(msg: &str) -> Self {
        AppError::Core(CoreError::Unauthorized(msg.to_string()))
    }

    pub fn forbidden(msg: &str) -> Self {
        AppError::Core(CoreError::Forbidden(msg.to_string()))
    }

    /// Status, machine-readable code, and client-facing message.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Core(CoreError::NotFound { entity, id }) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{entity} with id {id} not found"),
            ),
            AppError::Core(CoreError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Core(CoreError::Conflict(msg)) => {
                (StatusCode::CONFLICT, "CONFLICT", msg.clone())
            }
            AppError::Core(CoreError::Unauthorized(msg)) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
            }
            AppError::Core(CoreError::Forbidden(msg)) => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone())
            }
            AppError::Core(CoreError::Internal(msg)) => internal(msg),
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                MSG_RATE_LIMITED.to_string(),
            ),
            AppError::InternalError(msg) => internal(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        (status, axum::Json(json!({ "error": message, "code": code }))).into_response()
    }
}

fn internal(detail: &str) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %detail, "Request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        MSG_INTERNAL.to_string(),
    )
}

/// `RowNotFound` is a 404. A Postgres unique violation (`23505`) on one of
/// our `uq_` constraints is a 409 naming what collided. The rest are 500s.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            match db_err.constraint() {
                Some(name) if name.starts_with("uq_") => (
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    conflict_message(name).to_string(),
                ),
                _ => internal(&db_err.to_string()),
            }
        }
        other => internal(&other.to_string()),
    }
}

fn conflict_message(constraint: &str) -> &'static str {
    match constraint {
        "uq_config_entries_key" => "A config entry with this key already exists",
        "uq_sessions_token_hash" => "Session token collision",
        _ => "Value must be unique",
    }
}
