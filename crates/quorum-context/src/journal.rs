use std::str::FromStr;

use chrono::{DateTime, Utc};
use quorum_models::Action;
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::error::ContextError;

pub const TRADES_TABLE_DDL: &str = "\
CREATE TABLE IF NOT EXISTS trades (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    symbol      TEXT NOT NULL,
    action      TEXT NOT NULL,
    entry_price TEXT NOT NULL,
    pl          TEXT,
    status      TEXT NOT NULL,
    timestamp   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_trades_symbol_status ON trades (symbol, status, timestamp);";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeStatus {
    Open,
    Closed,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Open => "open",
            TradeStatus::Closed => "closed",
        }
    }
}

/// One trade as stored by the execution side.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub symbol: String,
    pub action: Action,
    pub entry_price: Decimal,
    /// Realised profit/loss; only meaningful once closed.
    pub pl: Option<Decimal>,
    pub status: TradeStatus,
    pub timestamp: DateTime<Utc>,
}

/// SQLite-backed trade journal.
///
/// Trades are written by the execution side of the bot; the consensus core
/// only reads closed trades back to build performance memory.
pub struct TradeJournal {
    conn: Connection,
}

impl TradeJournal {
    /// Open (creating if needed) the journal database at `path`.
    pub fn open(path: &str) -> Result<Self, ContextError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(TRADES_TABLE_DDL)?;
        Ok(Self { conn })
    }

    /// In-memory journal with the schema applied. Useful for testing.
    pub fn open_in_memory() -> Result<Self, ContextError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(TRADES_TABLE_DDL)?;
        Ok(Self { conn })
    }

    pub fn insert(&self, trade: &TradeRecord) -> Result<i64, ContextError> {
        self.conn.execute(
            "INSERT INTO trades (symbol, action, entry_price, pl, status, timestamp) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                trade.symbol,
                trade.action.as_str(),
                trade.entry_price.to_string(),
                trade.pl.map(|pl| pl.to_string()),
                trade.status.as_str(),
                trade.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Close an open trade with its realised P/L. Returns false if no such open trade.
    pub fn close(&self, id: i64, pl: Decimal) -> Result<bool, ContextError> {
        let updated = self.conn.execute(
            "UPDATE trades SET status = 'closed', pl = ?1 WHERE id = ?2 AND status = 'open'",
            rusqlite::params![pl.to_string(), id],
        )?;
        Ok(updated == 1)
    }

    /// The last `limit` closed trades for `symbol`, newest first.
    pub fn recent_closed(&self, symbol: &str, limit: usize) -> Result<Vec<TradeRecord>, ContextError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT symbol, action, entry_price, pl, status, timestamp \
             FROM trades WHERE symbol = ?1 AND status = 'closed' \
             ORDER BY timestamp DESC LIMIT ?2",
        )?;

        let raw = stmt
            .query_map(rusqlite::params![symbol, limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(symbol, action, entry_price, pl, timestamp)| {
                Ok(TradeRecord {
                    symbol,
                    action: Action::parse(&action)
                        .ok_or_else(|| ContextError::Corrupt(format!("action {action}")))?,
                    entry_price: parse_decimal(&entry_price)?,
                    pl: pl.as_deref().map(parse_decimal).transpose()?,
                    status: TradeStatus::Closed,
                    timestamp: DateTime::parse_from_rfc3339(&timestamp)
                        .map_err(|e| ContextError::Corrupt(format!("timestamp {timestamp}: {e}")))?
                        .with_timezone(&Utc),
                })
            })
            .collect()
    }

    /// Number of trades stored for a symbol, regardless of status.
    pub fn count(&self, symbol: &str) -> Result<u64, ContextError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM trades WHERE symbol = ?1",
            rusqlite::params![symbol],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

fn parse_decimal(raw: &str) -> Result<Decimal, ContextError> {
    Decimal::from_str(raw).map_err(|e| ContextError::Corrupt(format!("decimal {raw}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn trade(symbol: &str, days_ago: i64, pl: Option<Decimal>, status: TradeStatus) -> TradeRecord {
        let base = Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap();
        TradeRecord {
            symbol: symbol.to_string(),
            action: Action::Buy,
            entry_price: dec!(1.0850),
            pl,
            status,
            timestamp: base - Duration::days(days_ago),
        }
    }

    #[test]
    fn recent_closed_filters_and_orders() {
        let journal = TradeJournal::open_in_memory().unwrap();
        journal.insert(&trade("EURUSD", 3, Some(dec!(12.5)), TradeStatus::Closed)).unwrap();
        journal.insert(&trade("EURUSD", 1, Some(dec!(-4)), TradeStatus::Closed)).unwrap();
        journal.insert(&trade("EURUSD", 0, None, TradeStatus::Open)).unwrap();
        journal.insert(&trade("GBPUSD", 2, Some(dec!(3)), TradeStatus::Closed)).unwrap();

        let rows = journal.recent_closed("EURUSD", 5).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].pl, Some(dec!(-4)));
        assert_eq!(rows[1].pl, Some(dec!(12.5)));
        assert_eq!(journal.count("EURUSD").unwrap(), 3);
    }

    #[test]
    fn limit_is_respected() {
        let journal = TradeJournal::open_in_memory().unwrap();
        for day in 0..8 {
            journal.insert(&trade("USDJPY", day, Some(dec!(1)), TradeStatus::Closed)).unwrap();
        }
        assert_eq!(journal.recent_closed("USDJPY", 5).unwrap().len(), 5);
    }

    #[test]
    fn close_marks_trade_closed() {
        let journal = TradeJournal::open_in_memory().unwrap();
        let id = journal.insert(&trade("AUDUSD", 0, None, TradeStatus::Open)).unwrap();
        assert!(journal.recent_closed("AUDUSD", 5).unwrap().is_empty());

        assert!(journal.close(id, dec!(7.25)).unwrap());
        assert!(!journal.close(id, dec!(1)).unwrap());

        let rows = journal.recent_closed("AUDUSD", 5).unwrap();
        assert_eq!(rows[0].pl, Some(dec!(7.25)));
    }

    #[test]
    fn open_file_creates_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.db");
        let journal = TradeJournal::open(path.to_str().unwrap()).unwrap();
        assert_eq!(journal.count("EURUSD").unwrap(), 0);
    }
}
