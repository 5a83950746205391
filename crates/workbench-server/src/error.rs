//! Request-boundary error type and its HTTP mapping.
//!
//! Every failure a handler can produce is converted to a structured JSON
//! body here. Simulation failures are not errors — they travel in-band as
//! `{success: false}` inside a 200.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing request fields.
    #[error("{0}")]
    Validation(String),
    /// Feature gated out in the current mode.
    #[error("file writes are disabled in production mode")]
    Disabled,
    /// Unmatched route.
    #[error("not found")]
    NotFound,
    /// Filesystem or other unexpected failure. `expose` controls whether
    /// the detail reaches the client (never in production).
    #[error("{message}")]
    Internal { message: String, expose: bool },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            ApiError::Disabled => (
                StatusCode::NOT_IMPLEMENTED,
                json!({
                    "error": "File writes are disabled in production mode",
                    "hint": "run in development mode or set ALLOW_FILE_WRITES=true",
                }),
            ),
            ApiError::NotFound => (StatusCode::NOT_FOUND, json!({ "error": "Not found" })),
            ApiError::Internal { message, expose } => {
                let shown = if expose {
                    message
                } else {
                    "Internal server error".to_string()
                };
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": shown }))
            }
        };
        (status, Json(body)).into_response()
    }
}
