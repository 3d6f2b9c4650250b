//! Service trait and context types
//!
//! This module defines the `Service` trait that the HTTP layer implements,
//! and the `CoreContext` that gives it controlled access to engine
//! functionality. The engine provides the `*Impl` implementations; services
//! only ever see the handles.

use crate::errors::EngineError;
use crate::records::{Account, EssaySubmission};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;

/// Trait for long-running services started by the engine
#[async_trait]
pub trait Service: Send + Sync {
    /// Returns the name of the service
    fn name(&self) -> &str;

    /// Returns the version of the service
    fn version(&self) -> &str;

    /// Start serving with the given context, returning the bound address
    async fn start(&mut self, ctx: CoreContext) -> Result<SocketAddr, EngineError>;

    /// Stop serving; a no-op if the service is not running
    fn stop(&mut self) -> Result<(), EngineError>;
}

/// Context provided to services for engine interaction.
///
/// CoreContext is the sole API surface services use. Each handle is cheap to
/// clone and shares its implementation.
#[derive(Clone)]
pub struct CoreContext {
    /// Handle for the account list
    pub accounts: StoreHandle<Account>,

    /// Handle for the essay submission list
    pub essays: StoreHandle<EssaySubmission>,

    /// Handle for essay feedback generation
    pub feedback: FeedbackHandle,

    /// Handle for password storage and comparison
    pub credentials: CredentialHandle,
}

impl CoreContext {
    /// Create a new CoreContext with all handles
    pub fn new(
        accounts: StoreHandle<Account>,
        essays: StoreHandle<EssaySubmission>,
        feedback: FeedbackHandle,
        credentials: CredentialHandle,
    ) -> Self {
        Self {
            accounts,
            essays,
            feedback,
            credentials,
        }
    }
}

/// Callback applied to the full record list inside `StoreHandle::update`
pub type RecordUpdate<'a, T> = &'a mut dyn FnMut(&mut Vec<T>) -> Result<(), EngineError>;

/// Handle for one record list
///
/// Provides whole-list load and save, plus a locked read-modify-write.
pub struct StoreHandle<T> {
    inner: Arc<dyn StoreHandleImpl<T>>,
}

impl<T> Clone for StoreHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> StoreHandle<T> {
    /// Create a new StoreHandle with the given implementation
    pub fn new(inner: Arc<dyn StoreHandleImpl<T>>) -> Self {
        Self { inner }
    }

    /// Load every record, in stored order
    ///
    /// Never fails: unreadable data is logged by the implementation and
    /// reported as an empty list.
    pub fn load_all(&self) -> Vec<T> {
        self.inner.load_all()
    }

    /// Replace the stored list
    pub fn save_all(&self, records: &[T]) -> Result<(), EngineError> {
        self.inner.save_all(records)
    }

    /// Load, apply `apply`, and save if it succeeded, without another writer
    /// interleaving
    pub fn update(&self, apply: RecordUpdate<'_, T>) -> Result<(), EngineError> {
        self.inner.update(apply)
    }
}

/// Trait for store handle implementation (to be implemented by engine)
pub trait StoreHandleImpl<T>: Send + Sync {
    /// Load every record
    fn load_all(&self) -> Vec<T>;

    /// Overwrite every record
    fn save_all(&self, records: &[T]) -> Result<(), EngineError>;

    /// Locked read-modify-write
    fn update(&self, apply: RecordUpdate<'_, T>) -> Result<(), EngineError>;
}

/// Handle for feedback generation
#[derive(Clone)]
pub struct FeedbackHandle {
    inner: Arc<dyn FeedbackHandleImpl>,
}

impl FeedbackHandle {
    /// Create a new FeedbackHandle with the given implementation
    pub fn new(inner: Arc<dyn FeedbackHandleImpl>) -> Self {
        Self { inner }
    }

    /// Generate free-text feedback for an essay answering `question`
    pub async fn generate_feedback(
        &self,
        question: &str,
        essay: &str,
    ) -> Result<String, EngineError> {
        self.inner.generate_feedback(question, essay).await
    }
}

/// Trait for feedback handle implementation (to be implemented by engine)
#[async_trait]
pub trait FeedbackHandleImpl: Send + Sync {
    /// Generate feedback text
    async fn generate_feedback(&self, question: &str, essay: &str)
        -> Result<String, EngineError>;
}

/// Handle for credential storage and verification
#[derive(Clone)]
pub struct CredentialHandle {
    inner: Arc<dyn CredentialHandleImpl>,
}

impl CredentialHandle {
    /// Create a new CredentialHandle with the given implementation
    pub fn new(inner: Arc<dyn CredentialHandleImpl>) -> Self {
        Self { inner }
    }

    /// Turn a password into the form kept in the account record
    pub fn protect(&self, password: &str) -> String {
        self.inner.protect(password)
    }

    /// Check a supplied password against the stored form
    pub fn verify(&self, supplied: &str, stored: &str) -> bool {
        self.inner.verify(supplied, stored)
    }
}

/// Trait for credential handle implementation (to be implemented by engine)
pub trait CredentialHandleImpl: Send + Sync {
    /// Produce the stored form of a password
    fn protect(&self, password: &str) -> String;

    /// Compare a supplied password with a stored form
    fn verify(&self, supplied: &str, stored: &str) -> bool;
}
