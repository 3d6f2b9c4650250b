//! HTTP error responses
//!
//! Every failure is answered with `{ "error": "<message>" }` and a status
//! code; nothing else about the cause reaches the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sdk::errors::{EngineError, ErrorExt};
use serde_json::json;

/// An error ready to be sent to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Map a store failure to a 500 with a context-specific message,
    /// logging the underlying cause
    pub fn storage(err: EngineError, message: &str) -> Self {
        match err {
            EngineError::Validation(_) | EngineError::Auth(_) => err.into(),
            other => {
                tracing::error!("{}: {}", message, other);
                Self::internal(message)
            }
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match &err {
            EngineError::Validation(_) => Self::bad_request(err.user_hint()),
            EngineError::Auth(_) => Self::unauthorized(err.user_hint()),
            _ => {
                tracing::error!("Request failed: {}", err);
                Self::internal(err.user_hint())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
