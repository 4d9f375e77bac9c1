use std::sync::Arc;
use std::time::Duration;

use quorum_agents::ConsensusSynthesizer;
use quorum_models::{Action, PublishedSignal, SchedulerConfig};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::feed::SnapshotFeed;
use crate::prefilter::check_signal;

/// Polling loop: screen every symbol, ask for consensus on candidates, publish
/// the ones consensus does not veto.
pub struct Scheduler {
    synthesizer: ConsensusSynthesizer,
    feed: Arc<dyn SnapshotFeed>,
    config: SchedulerConfig,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(
        synthesizer: ConsensusSynthesizer,
        feed: Arc<dyn SnapshotFeed>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            synthesizer,
            feed,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Returns a CancellationToken that can be used to trigger shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run until cancelled or until the receiving side of `signals` is dropped.
    /// Cancellation is checked between symbols; a consensus already in flight
    /// runs to completion.
    pub async fn run(&mut self, signals: mpsc::Sender<PublishedSignal>) {
        let interval = Duration::from_secs(self.config.interval_seconds);
        let symbols = self.config.symbols.clone();
        info!(symbols = symbols.len(), interval_secs = interval.as_secs(), "Scheduler starting");

        'cycles: loop {
            for symbol in &symbols {
                if self.cancel.is_cancelled() {
                    break 'cycles;
                }
                if let Some(signal) = self.evaluate_symbol(symbol).await {
                    info!(symbol, id = %signal.id, action = %signal.action, "Signal published");
                    if signals.send(signal).await.is_err() {
                        warn!("Signal receiver dropped, stopping scheduler");
                        break 'cycles;
                    }
                }
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        info!("Scheduler stopped");
    }

    /// One symbol: snapshot, pre-filter, consensus. `None` when there is no
    /// snapshot, no candidate, or consensus answered HOLD.
    pub async fn evaluate_symbol(&mut self, symbol: &str) -> Option<PublishedSignal> {
        let snapshot = match self.feed.snapshot(symbol).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(symbol, error = %e, "No snapshot, skipping");
                return None;
            }
        };

        let Some(candidate) = check_signal(&snapshot, self.config.signal_threshold) else {
            debug!(symbol, "No candidate");
            return None;
        };
        info!(
            symbol,
            action = %candidate.action,
            confidence = %candidate.confidence,
            triggers = %candidate.triggers,
            "Signal triggered"
        );

        let decision = self.synthesizer.get_consensus(symbol, &snapshot, None).await;
        if decision.action == Action::Hold {
            info!(symbol, reasoning = %decision.reasoning, "Consensus vetoed candidate");
            return None;
        }

        Some(PublishedSignal::from_consensus(&candidate, &decision))
    }
}
