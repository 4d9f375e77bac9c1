use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::{debug, error};

use crate::error::ContextError;
use crate::sources::MacroSource;

pub const NO_DOCUMENTS: &str = "No research documents found.";

/// Characters kept from each research document.
const SNIPPET_CHARS: usize = 2000;

/// A research document read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ResearchDocument {
    pub source: String,
    pub content: String,
}

/// Builds the macro context from `.txt` research notes under a directory.
///
/// The assembled summary is kept in a moka cache for `ttl`, so a polling loop
/// does not rescan the directory on every cycle.
pub struct ResearchLoader {
    dir: PathBuf,
    cache: Cache<PathBuf, String>,
}

impl ResearchLoader {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            cache: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
        }
    }

    /// All non-empty `.txt` documents under the directory, sorted by path.
    pub async fn load_documents(&self) -> Result<Vec<ResearchDocument>, ContextError> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || scan_documents(&dir))
            .await
            .map_err(|e| ContextError::Unavailable(format!("research scan aborted: {e}")))?
    }

    /// Drop the cached summary so the next read rescans the directory.
    pub async fn invalidate(&self) {
        self.cache.invalidate(&self.dir).await;
    }

    async fn build_summary(&self) -> Result<String, ContextError> {
        let docs = self.load_documents().await?;
        if docs.is_empty() {
            return Ok(NO_DOCUMENTS.to_string());
        }

        let parts: Vec<String> = docs
            .iter()
            .map(|doc| {
                let snippet: String = doc.content.chars().take(SNIPPET_CHARS).collect();
                format!("--- SOURCE: {} ---\n{}\n", doc.source, snippet)
            })
            .collect();
        Ok(parts.join("\n"))
    }
}

fn scan_documents(dir: &Path) -> Result<Vec<ResearchDocument>, ContextError> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "Research directory missing");
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    collect_txt_files(dir, &mut paths)?;
    paths.sort();

    let mut docs = Vec::new();
    for path in paths {
        match std::fs::read_to_string(&path) {
            Ok(content) if !content.trim().is_empty() => {
                let source = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                docs.push(ResearchDocument { source, content });
            }
            Ok(_) => {}
            Err(e) => error!(path = %path.display(), error = %e, "Failed to read research document"),
        }
    }
    Ok(docs)
}

/// Symlinked directories are not descended into.
fn collect_txt_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), ContextError> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_txt_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "txt") {
            out.push(path);
        }
    }
    Ok(())
}

#[async_trait]
impl MacroSource for ResearchLoader {
    async fn summary_context(&self) -> Result<String, ContextError> {
        if let Some(summary) = self.cache.get(&self.dir).await {
            return Ok(summary);
        }
        let summary = self.build_summary().await?;
        self.cache.insert(self.dir.clone(), summary.clone()).await;
        Ok(summary)
    }
}
