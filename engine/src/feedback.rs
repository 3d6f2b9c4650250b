//! Feedback Generator
//!
//! Builds the marking prompt for a question/essay pair, sends it to the
//! configured LLM provider, and returns the provider's text unchanged.
//!
//! # Scoring scales
//!
//! Under [`ScalePolicy::Random`] each call asks for a score against a scale
//! drawn uniformly from [`ScoringScale::ALL`], so two identical submissions
//! can be scored out of different totals. [`ScalePolicy::Fixed`] pins the
//! scale.
//!
//! The returned text is not parsed or checked; nothing guarantees it even
//! contains a score.

use crate::llm::{LLMError, LLMProvider, Message};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use sdk::context::FeedbackHandleImpl;
use sdk::errors::EngineError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Message returned to callers for every generation failure
pub const GENERATION_FAILED: &str = "Failed to mark essay. Please try again.";

/// Maximum points a score may be requested against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoringScale {
    OutOf20,
    OutOf25,
    OutOf30,
    OutOf100,
}

impl ScoringScale {
    pub const ALL: [ScoringScale; 4] = [
        ScoringScale::OutOf20,
        ScoringScale::OutOf25,
        ScoringScale::OutOf30,
        ScoringScale::OutOf100,
    ];

    pub fn max_points(self) -> u32 {
        match self {
            ScoringScale::OutOf20 => 20,
            ScoringScale::OutOf25 => 25,
            ScoringScale::OutOf30 => 30,
            ScoringScale::OutOf100 => 100,
        }
    }

    pub fn from_max_points(points: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.max_points() == points)
    }
}

impl fmt::Display for ScoringScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "out of {}", self.max_points())
    }
}

/// How a scale is chosen for each submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalePolicy {
    Random,
    Fixed(ScoringScale),
}

impl ScalePolicy {
    pub fn pick<R: Rng + ?Sized>(self, rng: &mut R) -> ScoringScale {
        match self {
            ScalePolicy::Random => *ScoringScale::ALL
                .choose(rng)
                .unwrap_or(&ScoringScale::OutOf100),
            ScalePolicy::Fixed(scale) => scale,
        }
    }
}

impl fmt::Display for ScalePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalePolicy::Random => write!(f, "random"),
            ScalePolicy::Fixed(scale) => write!(f, "fixed ({})", scale),
        }
    }
}

/// Build the marking instruction sent to the provider
pub fn build_prompt(question: &str, essay: &str, scale: ScoringScale) -> String {
    format!(
        "You are marking a student essay. Give basic feedback only.\n\
         \n\
         Question: {question}\n\
         \n\
         Essay: {essay}\n\
         \n\
         Provide simple feedback focusing mainly on spelling and grammar. \
         Give a score {scale}. Keep it short and basic - just say if it's good or needs improvement. \
         Don't worry about economic theory accuracy."
    )
}

/// Generates essay feedback through an LLM provider
pub struct FeedbackGenerator {
    provider: Arc<dyn LLMProvider>,
    policy: ScalePolicy,
    timeout: Duration,
}

impl FeedbackGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>, policy: ScalePolicy, timeout: Duration) -> Self {
        Self {
            provider,
            policy,
            timeout,
        }
    }

    pub fn policy(&self) -> ScalePolicy {
        self.policy
    }

    /// Generate feedback for one essay
    ///
    /// # Errors
    ///
    /// Any provider failure or timeout becomes `EngineError::Generation`
    /// carrying only [`GENERATION_FAILED`]; the cause is logged here.
    pub async fn generate_feedback(&self, question: &str, essay: &str) -> Result<String, EngineError> {
        let scale = self.policy.pick(&mut rand::thread_rng());
        let prompt = build_prompt(question, essay, scale);

        tracing::debug!(
            provider = self.provider.name(),
            scale = scale.max_points(),
            "Requesting essay feedback"
        );

        let result = tokio::time::timeout(
            self.timeout,
            self.provider.generate(&[Message::user(prompt)]),
        )
        .await
        .unwrap_or(Err(LLMError::Timeout));

        match result {
            Ok(text) => {
                tracing::info!(
                    provider = self.provider.name(),
                    chars = text.len(),
                    "Essay feedback generated"
                );
                Ok(text)
            }
            Err(e) => {
                tracing::error!(provider = self.provider.name(), "Error marking essay: {}", e);
                Err(EngineError::Generation(GENERATION_FAILED.to_string()))
            }
        }
    }
}

#[async_trait]
impl FeedbackHandleImpl for FeedbackGenerator {
    async fn generate_feedback(&self, question: &str, essay: &str) -> Result<String, EngineError> {
        FeedbackGenerator::generate_feedback(self, question, essay).await
    }
}
