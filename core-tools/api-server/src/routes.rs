//! Request handlers
//!
//! Each handler does at most one load and one save against a store. Identity
//! is whatever username the client sends; there are no sessions or tokens.

use crate::error::ApiError;
use crate::extract::JsonBody;
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use sdk::context::CoreContext;
use sdk::errors::EngineError;
use sdk::records::{
    format_accounts_text, Account, EssaySubmission, NO_ESSAY_PLACEHOLDER, NO_QUESTION_PLACEHOLDER,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Registration body; every field is required and must be non-empty
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Login body
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Essay submission body; only `username` is required
#[derive(Debug, Default, Deserialize)]
pub struct MarkEssayRequest {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub essay: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// `{ message, user }`
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub message: String,
    pub user: Account,
}

/// `{ message, essay }`
#[derive(Debug, Serialize, Deserialize)]
pub struct EssayResponse {
    pub message: String,
    pub essay: EssaySubmission,
}

/// Treat absent and empty strings alike
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// GET /api/users
pub async fn list_users(State(ctx): State<CoreContext>) -> Json<Vec<Account>> {
    Json(ctx.accounts.load_all())
}

/// POST /api/register
pub async fn register(
    State(ctx): State<CoreContext>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let (username, email, password) = match (
        present(payload.username),
        present(payload.email),
        present(payload.password),
    ) {
        (Some(u), Some(e), Some(p)) => (u, e, p),
        _ => return Err(ApiError::bad_request("All fields are required")),
    };

    let account = Account::new(username, email, ctx.credentials.protect(&password));

    ctx.accounts
        .update(&mut |accounts| {
            if accounts.iter().any(|a| a.username == account.username) {
                return Err(EngineError::validation("Username already exists"));
            }
            if accounts.iter().any(|a| a.email == account.email) {
                return Err(EngineError::validation("Email already registered"));
            }
            accounts.push(account.clone());
            Ok(())
        })
        .map_err(|e| ApiError::storage(e, "Failed to save user data"))?;

    tracing::info!(username = %account.username, "Account created");

    Ok(Json(AccountResponse {
        message: "Account created successfully".to_string(),
        user: account,
    }))
}

/// POST /api/login
///
/// Unknown usernames and wrong passwords get the same 401.
pub async fn login(
    State(ctx): State<CoreContext>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let (username, password) = match (present(payload.username), present(payload.password)) {
        (Some(u), Some(p)) => (u, p),
        _ => return Err(ApiError::bad_request("Username and password are required")),
    };

    let user = ctx
        .accounts
        .load_all()
        .into_iter()
        .find(|a| a.username == username && ctx.credentials.verify(&password, &a.password))
        .ok_or_else(|| ApiError::from(EngineError::auth("Invalid username or password")))?;

    tracing::debug!(username = %user.username, "Login successful");

    Ok(Json(AccountResponse {
        message: "Login successful".to_string(),
        user,
    }))
}

/// POST /api/mark-essay
///
/// Feedback is generated before anything is stored, so a generation failure
/// leaves no record behind.
pub async fn mark_essay(
    State(ctx): State<CoreContext>,
    JsonBody(payload): JsonBody<MarkEssayRequest>,
) -> Result<Json<EssayResponse>, ApiError> {
    let username =
        present(payload.username).ok_or_else(|| ApiError::bad_request("Username is required"))?;

    let question =
        present(payload.question).unwrap_or_else(|| NO_QUESTION_PLACEHOLDER.to_string());
    let essay = present(payload.essay).unwrap_or_else(|| NO_ESSAY_PLACEHOLDER.to_string());

    let feedback = ctx.feedback.generate_feedback(&question, &essay).await?;

    let entry = EssaySubmission::new(username, question, essay, feedback);

    ctx.essays
        .update(&mut |essays| {
            essays.push(entry.clone());
            Ok(())
        })
        .map_err(|e| ApiError::storage(e, "Failed to save essay data"))?;

    tracing::info!(username = %entry.username, "Essay marked");

    Ok(Json(EssayResponse {
        message: "Essay marked successfully".to_string(),
        essay: entry,
    }))
}

/// GET /api/user-essays/:username
pub async fn user_essays(
    State(ctx): State<CoreContext>,
    Path(username): Path<String>,
) -> Json<Vec<EssaySubmission>> {
    let essays = ctx
        .essays
        .load_all()
        .into_iter()
        .filter(|e| e.username == username)
        .collect();
    Json(essays)
}

/// GET /api/essays
pub async fn list_essays(State(ctx): State<CoreContext>) -> Json<Vec<EssaySubmission>> {
    Json(ctx.essays.load_all())
}

/// Attach `body` as a download named `filename`
fn attachment(content_type: &'static str, filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", filename),
            ),
        ],
        body,
    )
        .into_response()
}

fn json_attachment<T: Serialize>(filename: &str, records: &[T]) -> Result<Response, ApiError> {
    let body = serde_json::to_string(records).map_err(|e| {
        tracing::error!("Failed to encode {}: {}", filename, e);
        ApiError::internal("Failed to export data")
    })?;
    Ok(attachment("application/json", filename, body))
}

/// GET /api/export/json
pub async fn export_users_json(State(ctx): State<CoreContext>) -> Result<Response, ApiError> {
    json_attachment("users_data.json", &ctx.accounts.load_all())
}

/// GET /api/export/text
pub async fn export_users_text(State(ctx): State<CoreContext>) -> Response {
    let text = format_accounts_text(&ctx.accounts.load_all());
    attachment("text/plain; charset=utf-8", "users_data.txt", text)
}

/// GET /api/export/essays-json
pub async fn export_essays_json(State(ctx): State<CoreContext>) -> Result<Response, ApiError> {
    json_attachment("essays_data.json", &ctx.essays.load_all())
}

/// GET /api/status
pub async fn status() -> Json<serde_json::Value> {
    Json(json!({
        "status": "running",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
