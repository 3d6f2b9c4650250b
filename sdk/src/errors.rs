//! Error types and handling
//!
//! This module provides the error types used throughout Essaymark.
//! All errors implement the `ErrorExt` trait which provides a single-line,
//! user-facing hint and indicates whether the failure is worth retrying.
//!
//! # Security
//!
//! Hints never carry the wrapped detail. Causes such as file paths, provider
//! responses or I/O messages are logged server-side only.

use thiserror::Error;

/// Trait for error extensions
///
/// Provides the user-visible side of an error. The hint is what the HTTP
/// layer puts in `{ "error": ... }` bodies for failures whose detail must
/// stay on the server.
pub trait ErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried by the caller. Essaymark itself
    /// never retries.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Validation**: missing or invalid input (HTTP 400)
/// - **Auth**: credential mismatch (HTTP 401)
/// - **Store**: record file I/O failure (HTTP 500)
/// - **Generation**: generative-text service failure (HTTP 500)
/// - **Config**: invalid configuration or missing credentials at startup
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, ErrorExt};
///
/// let error = EngineError::Validation("Username is required".to_string());
/// assert_eq!(error.user_hint(), "Username is required");
///
/// let store = EngineError::Store("disk full".to_string());
/// assert!(!store.user_hint().contains("disk"));
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Auth(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Shorthand for a validation failure with a user-facing message
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for an authentication failure with a user-facing message
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }
}

impl ErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            // Validation and auth messages are written for the user already
            Self::Validation(msg) | Self::Auth(msg) => msg,

            Self::Store(_) => "Failed to access stored data",
            Self::Generation(_) => "Failed to mark essay. Please try again.",
            Self::Config(_) => "Check your config.toml file for errors",
            Self::Network(_) => "Network operation failed. Check your connection",
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}
