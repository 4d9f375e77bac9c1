use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ContextError;
use crate::sources::NewsFeed;

/// A fixed list of headlines, e.g. supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct StaticNews {
    items: Vec<String>,
}

impl StaticNews {
    pub fn new(items: Vec<String>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl NewsFeed for StaticNews {
    async fn fetch_news(&self) -> Result<Vec<String>, ContextError> {
        Ok(self.items.clone())
    }
}

/// Headlines read from a text file maintained by an external ingester,
/// one item per line, in file order.
#[derive(Debug, Clone)]
pub struct FileNews {
    path: PathBuf,
    limit: usize,
}

impl FileNews {
    pub fn new(path: impl Into<PathBuf>, limit: usize) -> Self {
        Self {
            path: path.into(),
            limit,
        }
    }
}

#[async_trait]
impl NewsFeed for FileNews {
    async fn fetch_news(&self) -> Result<Vec<String>, ContextError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        Ok(raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(self.limit)
            .map(str::to_string)
            .collect())
    }
}

/// Characters of an item's summary kept in the headline text.
const SUMMARY_CHARS: usize = 200;

/// Headlines pulled live from RSS feeds, the first few items of each feed in
/// feed order. A feed that cannot be fetched or parsed is skipped.
pub struct RssNews {
    client: reqwest::Client,
    feeds: Vec<String>,
    per_feed: usize,
}

impl RssNews {
    pub fn new(client: reqwest::Client, feeds: Vec<String>, per_feed: usize) -> Self {
        Self {
            client,
            feeds,
            per_feed,
        }
    }

    async fn fetch_feed(&self, url: &str) -> Result<Vec<String>, ContextError> {
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        let channel = rss::Channel::read_from(&body[..])?;
        Ok(channel
            .items()
            .iter()
            .filter_map(headline)
            .take(self.per_feed)
            .collect())
    }
}

/// `Title: <title> | Summary: <first 200 chars>...`; items without a title are skipped.
fn headline(item: &rss::Item) -> Option<String> {
    let title = item.title().map(str::trim).filter(|t| !t.is_empty())?;
    let summary: String = item
        .description()
        .unwrap_or_default()
        .trim()
        .chars()
        .take(SUMMARY_CHARS)
        .collect();
    Some(format!("Title: {title} | Summary: {summary}..."))
}

#[async_trait]
impl NewsFeed for RssNews {
    async fn fetch_news(&self) -> Result<Vec<String>, ContextError> {
        let mut items = Vec::new();
        for url in &self.feeds {
            match self.fetch_feed(url).await {
                Ok(headlines) => {
                    debug!(feed = %url, count = headlines.len(), "Fetched news feed");
                    items.extend(headlines);
                }
                Err(e) => warn!(feed = %url, error = %e, "Skipping news feed"),
            }
        }
        Ok(items)
    }
}
