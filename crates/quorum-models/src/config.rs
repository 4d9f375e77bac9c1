use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::role::{ModelSelection, Role};

/// Top-level configuration for quorum.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuorumConfig {
    #[serde(default)]
    pub agents: AgentsConfig,
    #[serde(default)]
    pub governor: GovernorConfig,
    /// Role -> model id. Keys: TechnicalExpert, FundamentalExpert, SentimentExpert, RiskManager.
    #[serde(default)]
    pub models: RoleModels,
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
    /// Logical model choices and the provider serving each.
    #[serde(default = "default_catalog")]
    pub catalog: Vec<CatalogEntry>,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl Default for QuorumConfig {
    fn default() -> Self {
        Self {
            agents: AgentsConfig::default(),
            governor: GovernorConfig::default(),
            models: RoleModels::default(),
            providers: default_providers(),
            catalog: default_catalog(),
            context: ContextConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl QuorumConfig {
    /// Provider serving `model` according to the catalog.
    pub fn provider_for(&self, model: &str) -> Option<&str> {
        self.catalog
            .iter()
            .find(|entry| entry.id == model)
            .map(|entry| entry.provider.as_str())
    }

    /// Startup selection for a role: configured (or default) model, with its
    /// provider resolved through the catalog and falling back to `agents.default_provider`.
    pub fn selection_for(&self, role: Role) -> ModelSelection {
        let model = self.models.model_for(role);
        let provider = self
            .provider_for(&model)
            .unwrap_or(&self.agents.default_provider)
            .to_string();
        ModelSelection { provider, model }
    }
}

/// Configuration for the agent layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentsConfig {
    /// Upper bound for a single provider call in seconds.
    pub call_timeout_seconds: u64,
    /// Macro context is truncated to this many characters before prompting.
    pub macro_context_chars: usize,
    /// Number of closed trades summarised into performance memory.
    pub memory_trades: usize,
    /// Provider used for models missing from the catalog.
    pub default_provider: String,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            call_timeout_seconds: 45,
            macro_context_chars: 5000,
            memory_trades: 5,
            default_provider: "gemini".to_string(),
        }
    }
}

/// Backoff policy applied per agent on rate limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GovernorConfig {
    pub base_backoff_seconds: u64,
    pub max_backoff_seconds: u64,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            base_backoff_seconds: 5,
            max_backoff_seconds: 120,
        }
    }
}

/// Raw role -> model table. Kept loosely typed so one bad entry only
/// affects its own role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct RoleModels(pub BTreeMap<String, serde_json::Value>);

impl RoleModels {
    pub fn model_for(&self, role: Role) -> String {
        match self.0.get(role.as_str()) {
            Some(serde_json::Value::String(model)) if !model.trim().is_empty() => {
                model.trim().to_string()
            }
            Some(other) => {
                warn!(role = %role, value = %other, "Unreadable model entry, using default");
                role.default_model().to_string()
            }
            None => role.default_model().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Gemini,
    Ollama,
    #[serde(rename = "openai")]
    OpenAi,
    ClaudeCli,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderConfig {
    pub id: String,
    pub kind: ProviderKind,
    /// Override of the provider's default endpoint.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Environment variable holding the credential. `None` means no credential is needed.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: String,
    pub provider: String,
}

fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig {
            id: "gemini".to_string(),
            kind: ProviderKind::Gemini,
            base_url: None,
            api_key_env: Some("GEMINI_API_KEY".to_string()),
        },
        ProviderConfig {
            id: "ollama".to_string(),
            kind: ProviderKind::Ollama,
            base_url: None,
            api_key_env: None,
        },
    ]
}

fn default_catalog() -> Vec<CatalogEntry> {
    [
        ("gemini-1.5-flash", "gemini"),
        ("gemini-1.5-pro", "gemini"),
        ("deepseek-r1:1.5b", "ollama"),
        ("llama3", "ollama"),
        ("mistral", "ollama"),
    ]
    .into_iter()
    .map(|(id, provider)| CatalogEntry {
        id: id.to_string(),
        provider: provider.to_string(),
    })
    .collect()
}

/// Locations of the collaborator data sources.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContextConfig {
    /// SQLite file holding closed trades.
    pub journal_path: String,
    /// Directory scanned for `.txt` research documents.
    pub research_dir: String,
    /// How long the assembled research summary stays cached.
    pub research_cache_ttl_seconds: u64,
    /// Optional headline file, one item per line. Takes precedence over `news_feeds`.
    pub news_file: Option<String>,
    pub news_limit: usize,
    /// RSS feeds polled for headlines when no `news_file` is set.
    pub news_feeds: Vec<String>,
    pub news_per_feed: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            journal_path: "data/trades.db".to_string(),
            research_dir: "data/research".to_string(),
            research_cache_ttl_seconds: 300,
            news_file: None,
            news_limit: 9,
            news_feeds: vec![
                "http://feeds.marketwatch.com/marketwatch/topstories/".to_string(),
                "https://cnbc.com/id/10000664/device/rss/rss.html".to_string(),
                "https://content.dailyfx.com/feeds/all".to_string(),
            ],
            news_per_feed: 3,
        }
    }
}

/// Configuration for the polling loop used by `quorum run`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    pub symbols: Vec<String>,
    pub interval_seconds: u64,
    /// Directory holding `<SYMBOL>.json` market snapshots.
    pub snapshot_dir: String,
    /// Minimum pre-filter confidence before consensus is requested.
    pub signal_threshold: Decimal,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            symbols: vec![
                "EURUSD".to_string(),
                "GBPUSD".to_string(),
                "USDJPY".to_string(),
                "AUDUSD".to_string(),
            ],
            interval_seconds: 2,
            snapshot_dir: "data/snapshots".to_string(),
            signal_threshold: Decimal::new(3, 1),
        }
    }
}
