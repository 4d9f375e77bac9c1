use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use quorum_models::MarketSnapshot;

/// Source of the latest market snapshot per symbol.
#[async_trait]
pub trait SnapshotFeed: Send + Sync {
    async fn snapshot(&self, symbol: &str) -> Result<MarketSnapshot>;
}

/// Reads `<dir>/<SYMBOL>.json`, written by whatever computes the indicators.
pub struct DirectoryFeed {
    dir: PathBuf,
}

impl DirectoryFeed {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SnapshotFeed for DirectoryFeed {
    async fn snapshot(&self, symbol: &str) -> Result<MarketSnapshot> {
        let path = self.dir.join(format!("{symbol}.json"));
        let json = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
        let mut snapshot: MarketSnapshot = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse snapshot: {}", path.display()))?;
        if snapshot.symbol.is_empty() {
            snapshot.symbol = symbol.to_string();
        }
        Ok(snapshot)
    }
}
