use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::http::send_json;
use crate::error::ProviderError;
use crate::gateway::Provider;

pub const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com/v1";

/// Any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiProvider {
    pub fn new(client: Client, base_url: Option<&str>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url
                .unwrap_or(DEFAULT_OPENAI_BASE)
                .trim_end_matches('/')
                .to_string(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ProviderError> {
        let body = json!({
            "model": model,
            "messages": [{ "role": "user", "content": prompt }]
        });
        let response = send_json(
            self.name(),
            self.client
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&body),
        )
        .await?;

        Ok(response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}
