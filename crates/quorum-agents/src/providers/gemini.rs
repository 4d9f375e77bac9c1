use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::http::send_json;
use crate::error::ProviderError;
use crate::gateway::Provider;

pub const DEFAULT_GEMINI_BASE: &str = "https://generativelanguage.googleapis.com";

/// Google Gemini `generateContent` endpoint.
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiProvider {
    pub fn new(client: Client, base_url: Option<&str>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url
                .unwrap_or(DEFAULT_GEMINI_BASE)
                .trim_end_matches('/')
                .to_string(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/v1beta/models/{model}:generateContent", self.base_url);
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
        });

        let response = send_json(
            self.name(),
            self.client
                .post(url)
                .header("x-goog-api-key", &self.api_key)
                .json(&body),
        )
        .await?;

        Ok(candidate_text(&response))
    }
}

/// Concatenated text parts of the first candidate; empty when the answer was blocked.
fn candidate_text(response: &Value) -> String {
    response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_candidate_parts() {
        let response = json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"signal\":" }, { "text": " \"BUY\"}" }] } }]
        });
        assert_eq!(candidate_text(&response), "{\"signal\": \"BUY\"}");
    }

    #[test]
    fn blocked_answer_is_empty() {
        let response = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert_eq!(candidate_text(&response), "");
    }
}
