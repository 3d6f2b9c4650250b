//! End-to-end tests over file-backed stores
//!
//! Builds the real engine on a temporary data directory with a canned LLM
//! provider, then drives it through the HTTP router.

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

use essaymark_engine::config::Config;
use essaymark_engine::context::Engine;
use essaymark_engine::llm::{LLMError, LLMProvider, Message};
use sdk::errors::EngineError;

struct CannedProvider {
    calls: AtomicUsize,
    fail: bool,
}

impl CannedProvider {
    fn ok() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: true,
        })
    }
}

#[async_trait]
impl LLMProvider for CannedProvider {
    fn name(&self) -> &str {
        "canned"
    }

    async fn generate(&self, messages: &[Message]) -> essaymark_engine::llm::Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail {
            return Err(LLMError::ProviderUnavailable("503 from upstream".to_string()));
        }
        assert_eq!(messages.len(), 1);
        Ok(format!("Feedback #{}: mostly correct spelling.", n))
    }
}

fn config_in(dir: &Path) -> Config {
    let mut config = Config::default_config();
    config.core.data_dir = dir.to_path_buf();
    config.server.static_dir = None;
    config
}

fn app(config: &Config, provider: Arc<CannedProvider>) -> Router {
    let engine = Engine::with_provider(config, provider).unwrap();
    api_server::router(engine.context(), None)
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    call(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn post(app: &Router, uri: &str, payload: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    call(app, request).await
}

#[tokio::test]
async fn test_data_files_created_on_startup() {
    let temp = tempfile::tempdir().unwrap();
    let config = config_in(temp.path());

    let _app = app(&config, CannedProvider::ok());

    assert_eq!(
        std::fs::read_to_string(temp.path().join("users.json")).unwrap(),
        "[]"
    );
    assert_eq!(
        std::fs::read_to_string(temp.path().join("essays.json")).unwrap(),
        "[]"
    );
}

#[tokio::test]
async fn test_register_login_and_mark_end_to_end() {
    let temp = tempfile::tempdir().unwrap();
    let config = config_in(temp.path());
    let provider = CannedProvider::ok();
    let app = app(&config, Arc::clone(&provider));

    let (status, _) = post(
        &app,
        "/api/register",
        json!({ "username": "alice", "email": "alice@example.com", "password": "pw1" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, login) = post(
        &app,
        "/api/login",
        json!({ "username": "alice", "password": "pw1" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["user"]["username"], "alice");

    let (status, marked) = post(
        &app,
        "/api/mark-essay",
        json!({ "username": "alice", "question": "Define GDP", "essay": "Output." }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(marked["essay"]["feedback"], "Feedback #1: mostly correct spelling.");
    assert!(marked["essay"]["submittedAt"]
        .as_str()
        .unwrap()
        .ends_with('Z'));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

    let stored: Value =
        serde_json::from_str(&std::fs::read_to_string(temp.path().join("essays.json")).unwrap())
            .unwrap();
    assert_eq!(stored[0], marked["essay"]);
}

#[tokio::test]
async fn test_history_survives_restart() {
    let temp = tempfile::tempdir().unwrap();
    let config = config_in(temp.path());

    let first = app(&config, CannedProvider::ok());
    let mut submitted = Vec::new();
    for (user, question) in [("alice", "one"), ("bob", "two"), ("alice", "three")] {
        let (_, body) = post(
            &first,
            "/api/mark-essay",
            json!({ "username": user, "question": question, "essay": "text" }),
        )
        .await;
        submitted.push(body["essay"].clone());
    }

    let restarted = app(&config, CannedProvider::ok());
    let (status, history) = get(&restarted, "/api/user-essays/alice").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(history, json!([submitted[0], submitted[2]]));
}

#[tokio::test]
async fn test_deleted_files_reinitialized_after_restart() {
    let temp = tempfile::tempdir().unwrap();
    let config = config_in(temp.path());

    let first = app(&config, CannedProvider::ok());
    post(
        &first,
        "/api/register",
        json!({ "username": "alice", "email": "alice@example.com", "password": "pw1" }),
    )
    .await;

    std::fs::remove_file(temp.path().join("users.json")).unwrap();
    std::fs::remove_file(temp.path().join("essays.json")).unwrap();

    let restarted = app(&config, CannedProvider::ok());

    let (status, users) = get(&restarted, "/api/users").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users, json!([]));

    let (status, essays) = get(&restarted, "/api/essays").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(essays, json!([]));

    assert!(temp.path().join("users.json").exists());
    assert!(temp.path().join("essays.json").exists());
}

#[tokio::test]
async fn test_file_deleted_while_running() {
    let temp = tempfile::tempdir().unwrap();
    let config = config_in(temp.path());
    let app = app(&config, CannedProvider::ok());

    std::fs::remove_file(temp.path().join("users.json")).unwrap();

    let (status, users) = get(&app, "/api/users").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users, json!([]));

    let (status, _) = post(
        &app,
        "/api/register",
        json!({ "username": "alice", "email": "alice@example.com", "password": "pw1" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_generation_failure_leaves_no_record() {
    let temp = tempfile::tempdir().unwrap();
    let config = config_in(temp.path());
    let app = app(&config, CannedProvider::failing());

    let (status, body) = post(
        &app,
        "/api/mark-essay",
        json!({ "username": "alice", "question": "Q", "essay": "E" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to mark essay. Please try again." }));
    assert_eq!(
        std::fs::read_to_string(temp.path().join("essays.json")).unwrap(),
        "[]"
    );
}

#[tokio::test]
async fn test_corrupt_accounts_file_blocks_registration() {
    let temp = tempfile::tempdir().unwrap();
    let config = config_in(temp.path());
    let app = app(&config, CannedProvider::ok());

    std::fs::write(temp.path().join("users.json"), "{oops").unwrap();

    let (status, users) = get(&app, "/api/users").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users, json!([]));

    let (status, body) = post(
        &app,
        "/api/register",
        json!({ "username": "alice", "email": "alice@example.com", "password": "pw1" }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to save user data");
    assert_eq!(
        std::fs::read_to_string(temp.path().join("users.json")).unwrap(),
        "{oops"
    );
}

#[tokio::test]
async fn test_concurrent_registrations_all_persist() {
    let temp = tempfile::tempdir().unwrap();
    let config = config_in(temp.path());
    let app = app(&config, CannedProvider::ok());

    let tasks: Vec<_> = (0..10)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                post(
                    &app,
                    "/api/register",
                    json!({
                        "username": format!("user{}", i),
                        "email": format!("user{}@example.com", i),
                        "password": "pw"
                    }),
                )
                .await
            })
        })
        .collect();

    for task in tasks {
        let (status, _) = task.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    let (_, users) = get(&app, "/api/users").await;
    assert_eq!(users.as_array().unwrap().len(), 10);
}

#[test]
fn test_missing_api_key_fails_startup() {
    let temp = tempfile::tempdir().unwrap();
    let mut config = config_in(temp.path());
    config.llm.gemini.api_key_env = "ESSAYMARK_TEST_KEY_THAT_IS_NEVER_SET".to_string();

    let result = Engine::from_config(&config);

    assert!(matches!(result, Err(EngineError::Config(_))));
}
