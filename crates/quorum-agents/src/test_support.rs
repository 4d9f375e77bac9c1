//! Deterministic stand-ins for providers and collaborators.
//!
//! `ScriptedProvider` answers from rules matched against the prompt, from a
//! queue, or with a fixed reply, and records every call so tests can assert
//! exactly which prompts reached the "network".

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use quorum_context::{ContextError, MacroSource, NewsFeed, PerformanceSource};

use crate::error::ProviderError;
use crate::gateway::Provider;

pub type Reply = Result<String, ProviderError>;

/// Prompt fragment each role's prompt is recognisable by.
pub mod marker {
    pub const TECHNICAL: &str = "veteran technical analyst";
    pub const FUNDAMENTAL: &str = "global macro strategist";
    pub const SENTIMENT: &str = "sentiment trader";
    pub const RISK: &str = "desk's risk manager";
    pub const SYNTHESIS: &str = "head trader";
}

pub struct ScriptedProvider {
    rules: Vec<(String, Reply)>,
    queue: Mutex<VecDeque<Reply>>,
    default: Reply,
    delay: Option<Duration>,
    calls: AtomicUsize,
    log: Mutex<Vec<(String, String)>>,
}

impl ScriptedProvider {
    fn with_default(default: Reply) -> Self {
        Self {
            rules: Vec::new(),
            queue: Mutex::new(VecDeque::new()),
            default,
            delay: None,
            calls: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Same text for every call.
    pub fn always(text: &str) -> Self {
        Self::with_default(Ok(text.to_string()))
    }

    /// Same error for every call.
    pub fn failing(error: ProviderError) -> Self {
        Self::with_default(Err(error))
    }

    /// Replies in order; once drained every call fails as `Unknown`.
    pub fn sequence(replies: Vec<Reply>) -> Self {
        let provider = Self::with_default(Err(ProviderError::Unknown("script exhausted".into())));
        *provider.queue.lock().unwrap_or_else(PoisonError::into_inner) = replies.into();
        provider
    }

    /// Reply used when the prompt contains `marker` (case-insensitive). Rules
    /// are checked in insertion order before the queue and the default.
    pub fn on(mut self, marker: &str, reply: Reply) -> Self {
        self.rules.push((marker.to_ascii_lowercase(), reply));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.entries().into_iter().map(|(_, prompt)| prompt).collect()
    }

    pub fn models(&self) -> Vec<String> {
        self.entries().into_iter().map(|(model, _)| model).collect()
    }

    /// Prompts that contained `marker` (case-insensitive).
    pub fn prompts_matching(&self, marker: &str) -> Vec<String> {
        let marker = marker.to_ascii_lowercase();
        self.prompts()
            .into_iter()
            .filter(|prompt| prompt.to_ascii_lowercase().contains(&marker))
            .collect()
    }

    fn entries(&self) -> Vec<(String, String)> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((model.to_string(), prompt.to_string()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let lowered = prompt.to_ascii_lowercase();
        if let Some((_, reply)) = self.rules.iter().find(|(marker, _)| lowered.contains(marker)) {
            return reply.clone();
        }
        let queued = self.queue.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
        queued.unwrap_or_else(|| self.default.clone())
    }
}

/// Macro source with fixed text, or a fixed failure.
pub struct StaticMacro(pub Option<String>);

#[async_trait]
impl MacroSource for StaticMacro {
    async fn summary_context(&self) -> Result<String, ContextError> {
        self.0
            .clone()
            .ok_or_else(|| ContextError::Unavailable("macro source offline".into()))
    }
}

/// News feed that always fails.
pub struct OfflineNews;

#[async_trait]
impl NewsFeed for OfflineNews {
    async fn fetch_news(&self) -> Result<Vec<String>, ContextError> {
        Err(ContextError::Unavailable("news feed offline".into()))
    }
}

/// Performance memory with fixed text.
pub struct StaticPerformance(pub String);

#[async_trait]
impl PerformanceSource for StaticPerformance {
    async fn recent_performance(&self, _symbol: &str, _limit: usize) -> String {
        self.0.clone()
    }
}
