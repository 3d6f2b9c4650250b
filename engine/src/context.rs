//! Engine wiring
//!
//! Opens the record stores, builds the feedback generator, and exposes them
//! to services as a [`CoreContext`].

use crate::config::Config;
use crate::credentials::PlaintextVerifier;
use crate::feedback::FeedbackGenerator;
use crate::llm::gemini::GeminiProvider;
use crate::llm::LLMProvider;
use crate::secrets::load_api_key;
use crate::store::{AccountStore, EssayStore, RecordKind};
use sdk::context::{
    CoreContext, CredentialHandle, FeedbackHandle, FeedbackHandleImpl, StoreHandle,
    StoreHandleImpl,
};
use sdk::errors::EngineError;
use sdk::records::{Account, EssaySubmission};
use std::sync::Arc;
use std::time::Duration;

/// The engine's long-lived components
pub struct Engine {
    pub accounts: Arc<AccountStore>,
    pub essays: Arc<EssayStore>,
    pub feedback: Arc<FeedbackGenerator>,
}

impl Engine {
    /// Build the production engine: Gemini provider, file-backed stores
    ///
    /// # Errors
    ///
    /// Fails if the API key variable is missing or blank, or if a data file
    /// cannot be initialized.
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        let api_key = load_api_key(&config.llm.gemini.api_key_env)?;
        let provider = GeminiProvider::new(config.llm.gemini.clone(), api_key)
            .map_err(|e| EngineError::Config(e.to_string()))?;

        Self::with_provider(config, Arc::new(provider))
    }

    /// Build an engine over file-backed stores with any LLM provider
    pub fn with_provider(
        config: &Config,
        provider: Arc<dyn LLMProvider>,
    ) -> Result<Self, EngineError> {
        let accounts = AccountStore::open_in(&config.core.data_dir, RecordKind::Accounts)?;
        let essays = EssayStore::open_in(&config.core.data_dir, RecordKind::Essays)?;
        let feedback = FeedbackGenerator::new(
            provider,
            config.marking.policy()?,
            Duration::from_secs(config.llm.gemini.timeout_secs),
        );
        tracing::info!("Scoring scale policy: {}", feedback.policy());

        Ok(Self {
            accounts: Arc::new(accounts),
            essays: Arc::new(essays),
            feedback: Arc::new(feedback),
        })
    }

    /// Handles for services
    pub fn context(&self) -> CoreContext {
        let accounts = Arc::clone(&self.accounts) as Arc<dyn StoreHandleImpl<Account>>;
        let essays = Arc::clone(&self.essays) as Arc<dyn StoreHandleImpl<EssaySubmission>>;
        let feedback = Arc::clone(&self.feedback) as Arc<dyn FeedbackHandleImpl>;

        CoreContext::new(
            StoreHandle::new(accounts),
            StoreHandle::new(essays),
            FeedbackHandle::new(feedback),
            CredentialHandle::new(Arc::new(PlaintextVerifier)),
        )
    }
}
