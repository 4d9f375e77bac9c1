use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::http::send_json;
use crate::error::ProviderError;
use crate::gateway::Provider;

pub const DEFAULT_OLLAMA_BASE: &str = "http://localhost:11434";

/// Local Ollama server. Needs no credential.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
}

impl OllamaProvider {
    pub fn new(client: Client, base_url: Option<&str>) -> Self {
        Self {
            client,
            base_url: base_url
                .unwrap_or(DEFAULT_OLLAMA_BASE)
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ProviderError> {
        let body = json!({ "model": model, "prompt": prompt, "stream": false });
        let response = send_json(
            self.name(),
            self.client
                .post(format!("{}/api/generate", self.base_url))
                .json(&body),
        )
        .await?;

        Ok(response
            .get("response")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}
