use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::error;

use crate::error::ContextError;
use crate::journal::{TradeJournal, TradeRecord};
use crate::sources::PerformanceSource;

pub const NO_HISTORY: &str = "No past trade history for this symbol.";
pub const MEMORY_UNAVAILABLE: &str = "Could not retrieve memory.";

/// Summarises recent closed trades so the synthesis step can weigh past outcomes.
///
/// Journal access is synchronized via `Mutex` since `rusqlite::Connection` is not `Sync`.
pub struct PerformanceMemory {
    journal: Mutex<TradeJournal>,
}

impl PerformanceMemory {
    pub fn new(journal: TradeJournal) -> Self {
        Self {
            journal: Mutex::new(journal),
        }
    }

    fn load(&self, symbol: &str, limit: usize) -> Result<Vec<TradeRecord>, ContextError> {
        let journal = self
            .journal
            .lock()
            .map_err(|e| ContextError::Unavailable(format!("journal mutex poisoned: {e}")))?;
        journal.recent_closed(symbol, limit)
    }
}

/// Render trades (newest first) as the memory text.
pub fn format_performance(trades: &[TradeRecord]) -> String {
    if trades.is_empty() {
        return NO_HISTORY.to_string();
    }

    let mut wins = 0usize;
    let lines: Vec<String> = trades
        .iter()
        .map(|trade| {
            let won = trade.pl.is_some_and(|pl| pl > Decimal::ZERO);
            if won {
                wins += 1;
            }
            let pl = trade
                .pl
                .map(|pl| pl.to_string())
                .unwrap_or_else(|| "N/A".to_string());
            format!(
                "- {}: {} resulted in {} (${})",
                trade.timestamp.format("%Y-%m-%d"),
                trade.action,
                if won { "WON" } else { "LOST" },
                pl
            )
        })
        .collect();

    let win_rate = wins as f64 / trades.len() as f64 * 100.0;
    format!(
        "Past Performance ({} trades, {:.0}% WR):\n{}",
        trades.len(),
        win_rate,
        lines.join("\n")
    )
}

#[async_trait]
impl PerformanceSource for PerformanceMemory {
    async fn recent_performance(&self, symbol: &str, limit: usize) -> String {
        match self.load(symbol, limit) {
            Ok(trades) => format_performance(&trades),
            Err(e) => {
                error!(symbol, error = %e, "Memory retrieval failed");
                MEMORY_UNAVAILABLE.to_string()
            }
        }
    }
}
