use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::assist::AssistError;

/// Application-level error type.
/// Implements `IntoResponse` so axum handlers can return `Result<T, AppError>`.
///
/// No variant is fatal: the wizard stays usable after any single failure.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Confirmation required: {0}")]
    ConfirmationRequired(String),

    #[error("Photo too large: {0} bytes (limit {1})")]
    PhotoTooLarge(usize, usize),

    #[error("Assist request already in flight for {0}")]
    AssistBusy(String),

    #[error("Assist service unavailable: {0}")]
    AssistUnavailable(String),

    #[error("Assist response could not be parsed: {0}")]
    AssistMalformed(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<AssistError> for AppError {
    fn from(e: AssistError) -> Self {
        match e {
            AssistError::Unavailable(msg) => AppError::AssistUnavailable(msg),
            AssistError::MalformedResponse(msg) => AppError::AssistMalformed(msg),
            AssistError::Busy(target) => AppError::AssistBusy(target),
            AssistError::UnknownTarget(target) => {
                AppError::NotFound(format!("assist target {target}"))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::ConfirmationRequired(msg) => {
                (StatusCode::CONFLICT, "CONFIRMATION_REQUIRED", msg.clone())
            }
            AppError::PhotoTooLarge(size, limit) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PHOTO_TOO_LARGE",
                format!(
                    "Image is {size} bytes; the limit is {limit} bytes. Please choose a smaller photo."
                ),
            ),
            AppError::AssistBusy(target) => (
                StatusCode::CONFLICT,
                "ASSIST_BUSY",
                format!("An assist request for {target} is still running"),
            ),
            AppError::AssistUnavailable(msg) => {
                tracing::warn!("Assist unavailable: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "ASSIST_UNAVAILABLE",
                    "Could not generate content. Please try again.".to_string(),
                )
            }
            AppError::AssistMalformed(msg) => {
                tracing::warn!("Assist response malformed: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "ASSIST_MALFORMED",
                    "Could not correct automatically. Please try again.".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
