//! HTTP providers against a local mock server: request shape, answer
//! extraction, and status classification.

use std::time::Duration;

use quorum_agents::providers::{GeminiProvider, OllamaProvider, OpenAiProvider};
use quorum_agents::{Provider, ProviderError, ProviderGateway};
use quorum_models::{ProviderConfig, ProviderKind};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ANSWER: &str = r#"{"signal": "BUY", "confidence": 0.8, "reasoning": "RSI divergence"}"#;

fn gemini(server: &MockServer) -> GeminiProvider {
    GeminiProvider::new(reqwest::Client::new(), Some(&server.uri()), "test-key")
}

async fn gemini_error(status: u16, body: &str) -> ProviderError {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;
    gemini(&server)
        .generate("gemini-1.5-flash", "prompt")
        .await
        .unwrap_err()
}

#[tokio::test]
async fn gemini_sends_key_and_extracts_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "analyze EURUSD" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": ANSWER }] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = gemini(&server)
        .generate("gemini-1.5-flash", "analyze EURUSD")
        .await
        .unwrap();
    assert_eq!(text, ANSWER);
}

#[tokio::test]
async fn status_codes_are_classified() {
    assert!(matches!(gemini_error(429, "Too Many Requests").await, ProviderError::RateLimited(_)));
    assert!(matches!(
        gemini_error(400, r#"{"error": {"status": "RESOURCE_EXHAUSTED"}}"#).await,
        ProviderError::RateLimited(_)
    ));
    assert!(matches!(gemini_error(401, "API key not valid").await, ProviderError::AuthMissing(_)));
    assert!(matches!(gemini_error(403, "").await, ProviderError::AuthMissing(_)));
    assert!(matches!(gemini_error(500, "internal").await, ProviderError::Transient(_)));
    assert!(matches!(gemini_error(503, "overloaded").await, ProviderError::Transient(_)));
    assert!(matches!(gemini_error(404, "model not found").await, ProviderError::Unknown(_)));
}

#[tokio::test]
async fn ollama_requests_non_streaming_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({ "model": "deepseek-r1:1.5b", "stream": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "deepseek-r1:1.5b",
            "response": format!("<think>oversold</think>{ANSWER}"),
            "done": true
        })))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(reqwest::Client::new(), Some(&server.uri()));
    let text = provider.generate("deepseek-r1:1.5b", "prompt").await.unwrap();
    assert!(text.ends_with(ANSWER));
    assert_eq!(quorum_agents::parse_object(&text).unwrap()["signal"], "BUY");
}

#[tokio::test]
async fn openai_uses_bearer_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": ANSWER } }]
        })))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(reqwest::Client::new(), Some(&server.uri()), "sk-test");
    assert_eq!(provider.generate("gpt-4o-mini", "prompt").await.unwrap(), ANSWER);
}

#[tokio::test]
async fn unreachable_server_is_transient() {
    // Nothing listens on the discard port.
    let provider = OllamaProvider::new(reqwest::Client::new(), Some("http://127.0.0.1:9"));
    let err = provider.generate("llama3", "prompt").await.unwrap_err();
    assert!(matches!(err, ProviderError::Transient(_)), "got {err:?}");
}

#[tokio::test]
async fn gateway_routes_configured_providers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": ANSWER })))
        .expect(1)
        .mount(&server)
        .await;

    let providers = vec![
        ProviderConfig {
            id: "local".to_string(),
            kind: ProviderKind::Ollama,
            base_url: Some(server.uri()),
            api_key_env: None,
        },
        ProviderConfig {
            id: "gemini".to_string(),
            kind: ProviderKind::Gemini,
            base_url: Some(server.uri()),
            api_key_env: Some("QUORUM_TEST_UNSET_KEY".to_string()),
        },
    ];
    let gateway = ProviderGateway::from_config_with(&providers, Duration::from_secs(5), |_| None).unwrap();

    assert_eq!(gateway.invoke("local", "llama3", "prompt").await.unwrap(), ANSWER);
    // No credential: rejected before any request reaches the server.
    assert!(matches!(
        gateway.invoke("gemini", "gemini-1.5-flash", "prompt").await,
        Err(ProviderError::AuthMissing(_))
    ));
}
