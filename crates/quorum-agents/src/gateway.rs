use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use quorum_models::ProviderConfig;
use tracing::{debug, info, warn};

use crate::error::{AgentError, ProviderError};
use crate::providers;

/// One remote text-generation backend. Mockable for testing.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ProviderError>;
}

/// Uniform entry point over all configured providers.
///
/// Holds one client per provider id that has a credential, built once and
/// reused for the process lifetime. Performs no retries: backoff belongs to
/// each agent's governor.
pub struct ProviderGateway {
    clients: HashMap<String, Arc<dyn Provider>>,
    uncredentialed: BTreeSet<String>,
    timeout: Duration,
}

impl ProviderGateway {
    /// Empty gateway; add clients with [`with_provider`](Self::with_provider).
    pub fn new(timeout: Duration) -> Self {
        Self {
            clients: HashMap::new(),
            uncredentialed: BTreeSet::new(),
            timeout,
        }
    }

    /// Build from configuration, reading credentials from the process environment.
    pub fn from_config(providers: &[ProviderConfig], timeout: Duration) -> Result<Self, AgentError> {
        Self::from_config_with(providers, timeout, |name| std::env::var(name).ok())
    }

    /// Build from configuration with an explicit credential lookup.
    pub fn from_config_with(
        providers: &[ProviderConfig],
        timeout: Duration,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AgentError::Config(format!("HTTP client: {e}")))?;

        let mut gateway = Self::new(timeout);
        for config in providers {
            let api_key = match &config.api_key_env {
                Some(var) => match lookup(var).filter(|value| !value.trim().is_empty()) {
                    Some(key) => Some(key),
                    None => {
                        warn!(provider = %config.id, env = %var, "No credential configured, provider disabled");
                        gateway.uncredentialed.insert(config.id.clone());
                        continue;
                    }
                },
                None => None,
            };
            info!(provider = %config.id, kind = ?config.kind, "Provider client ready");
            gateway
                .clients
                .insert(config.id.clone(), providers::build(config, api_key, &client));
        }
        Ok(gateway)
    }

    pub fn with_provider(mut self, id: impl Into<String>, provider: Arc<dyn Provider>) -> Self {
        let id = id.into();
        self.uncredentialed.remove(&id);
        self.clients.insert(id, provider);
        self
    }

    /// Whether `provider_id` maps to a client with a valid credential.
    pub fn has_credential(&self, provider_id: &str) -> bool {
        self.clients.contains_key(provider_id)
    }

    /// Declared providers that were disabled for lack of a credential.
    pub fn uncredentialed(&self) -> impl Iterator<Item = &str> {
        self.uncredentialed.iter().map(String::as_str)
    }

    /// Run one generation call. Fails with `AuthMissing` before any I/O when the
    /// provider has no credential; a call exceeding the timeout is `Transient`.
    pub async fn invoke(
        &self,
        provider_id: &str,
        model_id: &str,
        prompt: &str,
    ) -> Result<String, ProviderError> {
        if prompt.trim().is_empty() {
            return Err(ProviderError::Unknown("empty prompt".to_string()));
        }
        let client = self
            .clients
            .get(provider_id)
            .ok_or_else(|| ProviderError::AuthMissing(format!("no credential for provider {provider_id}")))?;

        debug!(provider = provider_id, model = model_id, prompt_chars = prompt.len(), "Invoking provider");
        match tokio::time::timeout(self.timeout, client.generate(model_id, prompt)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Transient(format!(
                "{provider_id} timed out after {}s",
                self.timeout.as_secs()
            ))),
        }
    }
}
