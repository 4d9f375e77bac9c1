//! Interfaces for the data the consensus core consumes but does not produce.

use async_trait::async_trait;
use quorum_models::{MarketSnapshot, TechnicalSummary};

use crate::error::ContextError;

/// Research/macro context as one text blob.
#[async_trait]
pub trait MacroSource: Send + Sync {
    async fn summary_context(&self) -> Result<String, ContextError>;
}

/// Ordered list of short news items; may be empty.
#[async_trait]
pub trait NewsFeed: Send + Sync {
    async fn fetch_news(&self) -> Result<Vec<String>, ContextError>;
}

/// Text summary of recent closed trades. Implementations absorb their own
/// storage errors into a descriptive string.
#[async_trait]
pub trait PerformanceSource: Send + Sync {
    async fn recent_performance(&self, symbol: &str, limit: usize) -> String;
}

/// Turns a raw snapshot into the digest the experts are prompted with.
pub trait TechnicalSummarizer: Send + Sync {
    fn summarize(&self, snapshot: &MarketSnapshot) -> TechnicalSummary;
}
