use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Payload too large: {message}")]
    PayloadTooLarge { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("Rate limit exceeded: {message}")]
    RateLimitError { message: String },

    #[error("Token error: {message}")]
    TokenError { message: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Internal server error: {message}")]
    InternalError { message: String },
}

/// JSON body returned for every failed request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    fn new(message: impl Into<String>, error_code: &str, details: Option<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            error_code: error_code.to_string(),
            details,
        }
    }
}

pub struct ErrorHandler;

impl ErrorHandler {
    /// Converts an AppError into a status code and a client-facing body
    pub fn handle_error(error: AppError) -> (StatusCode, ErrorResponse) {
        match error {
            AppError::ValidationError { message } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(message, "VALIDATION_FAILED", None),
            ),

            AppError::Unauthorized { message } => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new(message, "UNAUTHORIZED", None),
            ),

            // Never tell the client why a token failed to decode
            AppError::TokenError { message } => {
                tracing::debug!("Rejected token: {}", message);
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse::new("Invalid token", "INVALID_TOKEN", None),
                )
            }

            AppError::PayloadTooLarge { message } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorResponse::new(message, "PAYLOAD_TOO_LARGE", None),
            ),

            AppError::Conflict { message } => (
                StatusCode::CONFLICT,
                ErrorResponse::new(message, "CONFLICT", None),
            ),

            AppError::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new(
                    format!("{} not found", resource),
                    "NOT_FOUND",
                    Some(format!("No {} with id '{}'", resource.to_lowercase(), id)),
                ),
            ),

            AppError::RateLimitError { message } => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorResponse::new(
                    "Too many requests from this IP, please try again later",
                    "RATE_LIMITED",
                    Some(message),
                ),
            ),

            AppError::StorageError { message } => {
                tracing::error!("Storage failure: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Storage operation failed", "STORAGE_FAILED", None),
                )
            }

            AppError::InternalError { message } => {
                tracing::error!("Internal failure: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("An unexpected error occurred", "INTERNAL_ERROR", None),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = ErrorHandler::handle_error(self);
        (status, Json(body)).into_response()
    }
}

/// Body rejections get the same error envelope as every other failure.
/// Anything but an oversized body is a client validation error.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return AppError::PayloadTooLarge { message: "Request body is too large".to_string() };
        }

        AppError::validation_failed(rejection.body_text())
    }
}

// Convenience functions for creating specific errors
impl AppError {
    pub fn validation_failed(message: impl Into<String>) -> Self {
        AppError::ValidationError { message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized { message: message.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict { message: message.into() }
    }

    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        AppError::NotFound { resource, id: id.into() }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        AppError::RateLimitError { message: message.into() }
    }

    pub fn token_error(message: impl Into<String>) -> Self {
        AppError::TokenError { message: message.into() }
    }

    pub fn storage_failed(message: impl Into<String>) -> Self {
        AppError::StorageError { message: message.into() }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        AppError::InternalError { message: message.into() }
    }
}
