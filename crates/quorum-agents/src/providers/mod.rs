//! Concrete text-generation backends behind the [`Provider`](crate::gateway::Provider) trait.

pub mod claude_cli;
pub mod gemini;
pub mod http;
pub mod ollama;
pub mod openai;

use std::sync::Arc;

use quorum_models::{ProviderConfig, ProviderKind};
use reqwest::Client;

pub use claude_cli::ClaudeCliProvider;
pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use crate::gateway::Provider;

/// Build the client for one configured provider. `api_key` is the resolved
/// credential, if the provider declares one.
pub fn build(
    config: &ProviderConfig,
    api_key: Option<String>,
    client: &Client,
) -> Arc<dyn Provider> {
    let base_url = config.base_url.as_deref();
    let key = api_key.unwrap_or_default();
    match config.kind {
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(client.clone(), base_url, key)),
        ProviderKind::Ollama => Arc::new(OllamaProvider::new(client.clone(), base_url)),
        ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(client.clone(), base_url, key)),
        ProviderKind::ClaudeCli => Arc::new(ClaudeCliProvider::new(base_url)),
    }
}
