//! Essaymark SDK
//!
//! Shared library providing record types, errors, and the service context.
//! This crate is used by both the engine and the HTTP API.

/// Service trait and context handles
pub mod context;

/// Error types and handling
pub mod errors;

/// Persisted record types
pub mod records;

// Re-export commonly used types
pub use context::{
    CoreContext, CredentialHandle, CredentialHandleImpl, FeedbackHandle, FeedbackHandleImpl,
    RecordUpdate, Service, StoreHandle, StoreHandleImpl,
};
pub use errors::{EngineError, ErrorExt};
pub use records::{Account, EssaySubmission, NO_ESSAY_PLACEHOLDER, NO_QUESTION_PLACEHOLDER};
