//! Credential handling for the generative-text service
//!
//! The API key is read once from the environment at startup and kept in a
//! `SecretString` so it cannot end up in logs by accident. Provider error
//! text is passed through `scrub_secrets` before it is logged.

use regex::Regex;
use sdk::errors::EngineError;
use std::fmt;
use std::sync::OnceLock;

/// A wrapper for sensitive string data that prevents accidental logging.
///
/// `Debug` and `Display` always print `[REDACTED]`. Use `expose()` to get
/// the raw value at the single point where it is sent.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Access the raw underlying string
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// Read the API key from the environment variable `var`.
///
/// # Errors
///
/// Returns `EngineError::Config` when the variable is unset, not valid
/// UTF-8, or blank. There is deliberately no placeholder fallback.
pub fn load_api_key(var: &str) -> Result<SecretString, EngineError> {
    let value = std::env::var(var).map_err(|_| {
        EngineError::Config(format!(
            "Environment variable {} is not set; it must hold the Gemini API key",
            var
        ))
    })?;

    if value.trim().is_empty() {
        return Err(EngineError::Config(format!(
            "Environment variable {} is empty; it must hold the Gemini API key",
            var
        )));
    }

    tracing::debug!("Loaded API key from {}", var);
    Ok(SecretString::new(value.trim()))
}

/// Whether `var` currently holds a non-blank value, without reading it into
/// a secret
pub fn api_key_present(var: &str) -> bool {
    std::env::var(var)
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false)
}

static SECRET_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

/// Patterns matched:
/// - Google API keys: AIza[0-9A-Za-z-_]{35}
/// - key query parameters: key=...
/// - Bearer tokens: Bearer\s+[^\s]{20,}
fn get_secret_patterns() -> &'static Vec<Regex> {
    SECRET_PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"AIza[0-9A-Za-z\-_]{35}").expect("Invalid Google pattern"),
            Regex::new(r"([?&]key=)[^&\s]+").expect("Invalid key parameter pattern"),
            Regex::new(r"Bearer\s+[^\s]{20,}").expect("Invalid Bearer pattern"),
        ]
    })
}

/// Replace anything that looks like a credential with `[REDACTED]`
pub fn scrub_secrets(text: &str) -> String {
    let mut result = text.to_string();
    for (i, pattern) in get_secret_patterns().iter().enumerate() {
        let replacement = if i == 1 { "${1}[REDACTED]" } else { "[REDACTED]" };
        result = pattern.replace_all(&result, replacement).into_owned();
    }
    result
}
