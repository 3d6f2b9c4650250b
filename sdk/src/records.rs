//! Record types persisted by the Record Store
//!
//! Both record kinds serialize with camelCase field names, matching documents
//! written by earlier deployments. Every field must be a string; a document
//! holding any other value fails to parse and the store treats it as corrupt.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Placeholder stored when an essay is submitted without a question
pub const NO_QUESTION_PLACEHOLDER: &str = "No question provided";

/// Placeholder stored when an essay is submitted without a body
pub const NO_ESSAY_PLACEHOLDER: &str = "No essay provided";

/// A registered user
///
/// `password` holds whatever the configured credential verifier stored,
/// which is the plaintext password for the default verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub username: String,
    pub email: String,
    pub password: String,

    /// Registration time; absent on accounts created before it was recorded
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "iso8601::option"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Create an account stamped with the current time
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            created_at: Some(now_millis()),
        }
    }
}

/// One marked essay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EssaySubmission {
    pub username: String,
    pub question: String,
    pub essay: String,
    pub feedback: String,
    #[serde(with = "iso8601")]
    pub submitted_at: DateTime<Utc>,
}

impl EssaySubmission {
    /// Create a submission stamped with the current time
    pub fn new(
        username: impl Into<String>,
        question: impl Into<String>,
        essay: impl Into<String>,
        feedback: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            question: question.into(),
            essay: essay.into(),
            feedback: feedback.into(),
            submitted_at: now_millis(),
        }
    }
}

/// Current time truncated to the precision timestamps are stored with
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Render accounts as the plain-text dump offered by the text export
///
/// ```
/// use sdk::records::{format_accounts_text, Account};
///
/// let text = format_accounts_text(&[]);
/// assert!(text.starts_with("USER ACCOUNT DATA\n"));
/// ```
pub fn format_accounts_text(accounts: &[Account]) -> String {
    let mut out = String::from("USER ACCOUNT DATA\n");
    out.push_str("==================\n\n");

    for (index, account) in accounts.iter().enumerate() {
        let created = account
            .created_at
            .map(iso8601::format)
            .unwrap_or_else(|| "unknown".to_string());

        // Writing to a String cannot fail
        let _ = writeln!(out, "User {}:", index + 1);
        let _ = writeln!(out, "Username: {}", account.username);
        let _ = writeln!(out, "Email: {}", account.email);
        let _ = writeln!(out, "Password: {}", account.password);
        let _ = writeln!(out, "Created: {}", created);
        out.push('\n');
    }

    out
}

/// ISO-8601 timestamps with millisecond precision and a `Z` suffix
pub mod iso8601 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(value: DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(dt) => serializer.serialize_str(&super::format(*dt)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            raw.map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
        }
    }
}
