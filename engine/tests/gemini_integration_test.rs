//! Integration tests for the Gemini provider and feedback generation
//!
//! Runs against a wiremock server standing in for the Generative Language API.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    matchers::{body_string_contains, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use essaymark_engine::config::GeminiConfig;
use essaymark_engine::feedback::{FeedbackGenerator, ScalePolicy, ScoringScale, GENERATION_FAILED};
use essaymark_engine::llm::{gemini::GeminiProvider, LLMError, LLMProvider, Message};
use essaymark_engine::secrets::SecretString;
use sdk::errors::EngineError;

const GENERATE_PATH: &str = "/models/gemini-1.5-flash:generateContent";

fn provider_for(server: &MockServer, timeout_secs: u64) -> GeminiProvider {
    let config = GeminiConfig {
        base_url: server.uri(),
        timeout_secs,
        ..GeminiConfig::default()
    };
    GeminiProvider::new(config, SecretString::new("test-key-123")).unwrap()
}

fn reply(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{ "text": text }]
            }
        }]
    })
}

#[tokio::test]
async fn test_generate_sends_key_header() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("Good grammar. 18 out of 20")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server, 5);
    let text = provider.generate(&[Message::user("Mark this")]).await.unwrap();

    assert_eq!(text, "Good grammar. 18 out of 20");
}

#[tokio::test]
async fn test_multi_part_reply_is_concatenated() {
    let server = MockServer::start().await;

    let body = json!({
        "candidates": [{
            "content": { "parts": [{ "text": "Spelling is fine. " }, { "text": "Score: 22 out of 25" }] }
        }]
    });

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let provider = provider_for(&server, 5);
    let text = provider.generate(&[Message::user("Mark this")]).await.unwrap();

    assert_eq!(text, "Spelling is fine. Score: 22 out of 25");
}

#[tokio::test]
async fn test_error_statuses_are_classified() {
    let cases: [(u16, fn(&LLMError) -> bool); 3] = [
        (429, |e| matches!(e, LLMError::RateLimitExceeded)),
        (403, |e| matches!(e, LLMError::AuthenticationFailed(_))),
        (503, |e| matches!(e, LLMError::ProviderUnavailable(_))),
    ];

    for (status, check) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;

        let provider = provider_for(&server, 5);
        let err = provider
            .generate(&[Message::user("Mark this")])
            .await
            .unwrap_err();

        assert!(check(&err), "status {} mapped to {:?}", status, err);
    }
}

#[tokio::test]
async fn test_missing_candidates_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let provider = provider_for(&server, 5);
    let err = provider
        .generate(&[Message::user("Mark this")])
        .await
        .unwrap_err();

    assert!(matches!(err, LLMError::ParseError(_)));
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(reply("late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let provider = provider_for(&server, 1);
    let err = provider
        .generate(&[Message::user("Mark this")])
        .await
        .unwrap_err();

    assert!(matches!(err, LLMError::Timeout));
}

#[tokio::test]
async fn test_feedback_prompt_reaches_provider() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_string_contains("What causes inflation?"))
        .and(body_string_contains("out of 30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("Nice work. 25 out of 30")))
        .expect(1)
        .mount(&server)
        .await;

    let generator = FeedbackGenerator::new(
        Arc::new(provider_for(&server, 5)),
        ScalePolicy::Fixed(ScoringScale::OutOf30),
        Duration::from_secs(5),
    );

    let feedback = generator
        .generate_feedback("What causes inflation?", "Too much money.")
        .await
        .unwrap();

    assert_eq!(feedback, "Nice work. 25 out of 30");
}

#[tokio::test]
async fn test_feedback_failure_hides_cause() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal quota detail"))
        .mount(&server)
        .await;

    let generator = FeedbackGenerator::new(
        Arc::new(provider_for(&server, 5)),
        ScalePolicy::Random,
        Duration::from_secs(5),
    );

    let err = generator
        .generate_feedback("Q", "E")
        .await
        .unwrap_err();

    match err {
        EngineError::Generation(message) => assert_eq!(message, GENERATION_FAILED),
        other => panic!("Expected Generation error, got {:?}", other),
    }
}
