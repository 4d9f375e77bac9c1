//! Quorum - multi-agent consensus for trade signals.
//!
//! Four role-specialised language-model experts (technical, macro, sentiment,
//! risk) are consulted concurrently and a head-trader synthesis reduces their
//! opinions to one BUY/SELL/HOLD decision. Provider failures degrade to
//! neutral opinions or a fixed HOLD; a decision is always produced.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use quorum::models::{MarketSnapshot, QuorumConfig};
//! use quorum::agents::ConsensusSynthesizer;
//!
//! # async fn run(snapshot: MarketSnapshot) -> anyhow::Result<()> {
//! let config = quorum::load_config("config/quorum.toml")?;
//! let mut synthesizer = quorum::build_synthesizer(&config)?;
//! let decision = synthesizer.get_consensus(&snapshot.symbol, &snapshot, None).await;
//! println!("{} {}", decision.action, decision.confidence);
//! # Ok(())
//! # }
//! ```

pub use quorum_agents as agents;
pub use quorum_context as context;
pub use quorum_models as models;

pub mod commands;
pub mod feed;
pub mod prefilter;
pub mod scheduler;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use quorum_agents::{Collaborators, ConsensusSynthesizer, ModelRegistry, ProviderGateway};
use quorum_context::{
    FileNews, NewsFeed, PerformanceMemory, ResearchLoader, RssNews, SnapshotSummarizer,
    StaticNews, TradeJournal,
};
use quorum_models::{ContextConfig, QuorumConfig};

/// Upper bound for fetching one news feed.
const NEWS_FEED_TIMEOUT: Duration = Duration::from_secs(10);

/// Read and parse the TOML configuration at `path`.
pub fn load_config(path: &str) -> Result<QuorumConfig> {
    let config_str =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read config: {path}"))?;
    toml::from_str(&config_str).with_context(|| format!("Failed to parse config: {path}"))
}

/// Build the provider gateway. Providers whose credential is missing are
/// disabled, not fatal.
pub fn build_gateway(config: &QuorumConfig) -> Result<Arc<ProviderGateway>> {
    let timeout = Duration::from_secs(config.agents.call_timeout_seconds);
    let gateway = ProviderGateway::from_config(&config.providers, timeout)
        .context("Failed to build provider gateway")?;
    Ok(Arc::new(gateway))
}

/// News source: the headline file if configured, else the RSS feeds, else nothing.
pub fn build_news(context: &ContextConfig) -> Result<Arc<dyn NewsFeed>> {
    if let Some(path) = &context.news_file {
        return Ok(Arc::new(FileNews::new(path, context.news_limit)));
    }
    if context.news_feeds.is_empty() {
        return Ok(Arc::new(StaticNews::default()));
    }
    let client = reqwest::Client::builder()
        .timeout(NEWS_FEED_TIMEOUT)
        .build()
        .context("Failed to build news HTTP client")?;
    Ok(Arc::new(RssNews::new(
        client,
        context.news_feeds.clone(),
        context.news_per_feed,
    )))
}

/// Production collaborators: research directory, trade journal, news.
pub fn build_collaborators(config: &QuorumConfig) -> Result<Collaborators> {
    let context = &config.context;

    if let Some(parent) = Path::new(&context.journal_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create journal directory: {}", parent.display())
            })?;
        }
    }
    let journal = TradeJournal::open(&context.journal_path)
        .with_context(|| format!("Failed to open trade journal: {}", context.journal_path))?;

    Ok(Collaborators {
        summarizer: Arc::new(SnapshotSummarizer),
        macro_source: Arc::new(ResearchLoader::new(
            &context.research_dir,
            Duration::from_secs(context.research_cache_ttl_seconds),
        )),
        news: build_news(context)?,
        performance: Arc::new(PerformanceMemory::new(journal)),
    })
}

/// Build a ConsensusSynthesizer from configuration.
pub fn build_synthesizer(config: &QuorumConfig) -> Result<ConsensusSynthesizer> {
    let gateway = build_gateway(config)?;
    let registry = ModelRegistry::from_config(config, Arc::clone(&gateway));
    let collaborators = build_collaborators(config)?;
    Ok(ConsensusSynthesizer::new(
        gateway,
        registry,
        collaborators,
        &config.agents,
        &config.governor,
    ))
}
