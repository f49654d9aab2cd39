/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>` which converts to the response
/// envelope with the appropriate HTTP status code.
///
/// Authentication and authorization failures deliberately collapse into one
/// uniform 401 "Access denied" so the response never reveals whether a
/// token was missing, malformed, expired, issued for the wrong purpose, or
/// valid but for a blocked or demoted user.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use crate::response;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Validation failure (400) with a field-level detail
    Validation(String),

    /// Uniform guard rejection (401, always "Access denied")
    AccessDenied,

    /// Unauthorized (401) with a business-specific message
    Unauthorized(String),

    /// Not found (404)
    NotFound(String),

    /// Internal server error (500)
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Validation(msg) => write!(f, "Validation failed: {}", msg),
            ApiError::AccessDenied => write!(f, "Access denied"),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Every failure mirrors its message into `err`; Validation and
        // Internal carry a more specific detail there instead.
        match self {
            ApiError::BadRequest(msg) => {
                response::failure(StatusCode::BAD_REQUEST, &msg, Some(msg.clone()))
            }
            ApiError::Validation(msg) => {
                response::failure(StatusCode::BAD_REQUEST, "Validation failed", Some(msg))
            }
            ApiError::AccessDenied => response::failure(
                StatusCode::UNAUTHORIZED,
                "Access denied",
                Some("Access denied".to_string()),
            ),
            ApiError::Unauthorized(msg) => {
                response::failure(StatusCode::UNAUTHORIZED, &msg, Some(msg.clone()))
            }
            ApiError::NotFound(msg) => {
                response::failure(StatusCode::NOT_FOUND, &msg, Some(msg.clone()))
            }
            ApiError::Internal(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                response::failure(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred",
                    Some(msg),
                )
            }
        }
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

/// Convert JWT errors to API errors
///
/// Any token problem is a guard failure and stays uniform.
impl From<taskify_shared::auth::jwt::JwtError> for ApiError {
    fn from(_err: taskify_shared::auth::jwt::JwtError) -> Self {
        ApiError::AccessDenied
    }
}

/// Convert password errors to API errors
impl From<taskify_shared::auth::password::PasswordError> for ApiError {
    fn from(err: taskify_shared::auth::password::PasswordError) -> Self {
        ApiError::Internal(format!("Password operation failed: {}", err))
    }
}

/// Convert request validation errors to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let detail = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "is invalid".to_string());
                    format!("{}: {}", field, message)
                })
            })
            .collect::<Vec<_>>()
            .join("; ");

        ApiError::Validation(detail)
    }
}
