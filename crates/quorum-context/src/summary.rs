use std::collections::BTreeMap;

use quorum_models::snapshot::indicator;
use quorum_models::{MarketSnapshot, TechnicalSummary};
use rust_decimal::prelude::ToPrimitive;

use crate::sources::TechnicalSummarizer;

const NAMED: [&str; 8] = [
    indicator::RSI,
    indicator::MACD,
    indicator::MACD_SIGNAL,
    indicator::MACD_HIST,
    indicator::ATR,
    indicator::BB_LOWER,
    indicator::BB_MIDDLE,
    indicator::BB_UPPER,
];

/// Reads the pre-computed indicators carried by the snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotSummarizer;

impl TechnicalSummarizer for SnapshotSummarizer {
    fn summarize(&self, snapshot: &MarketSnapshot) -> TechnicalSummary {
        let extra: BTreeMap<String, f64> = snapshot
            .indicators
            .iter()
            .filter(|(name, value)| !NAMED.contains(&name.as_str()) && value.is_finite())
            .map(|(name, value)| (name.clone(), *value))
            .collect();

        TechnicalSummary {
            symbol: snapshot.symbol.clone(),
            price: snapshot.price,
            rsi: snapshot.indicator(indicator::RSI),
            macd: snapshot.indicator(indicator::MACD),
            macd_signal: snapshot.indicator(indicator::MACD_SIGNAL),
            macd_hist: snapshot.indicator(indicator::MACD_HIST),
            atr: snapshot.indicator(indicator::ATR),
            bb_status: bollinger_status(snapshot),
            trend: snapshot.trend.clone(),
            extra,
        }
    }
}

fn bollinger_status(snapshot: &MarketSnapshot) -> String {
    let (Some(lower), Some(upper), Some(price)) = (
        snapshot.indicator(indicator::BB_LOWER),
        snapshot.indicator(indicator::BB_UPPER),
        snapshot.price.to_f64(),
    ) else {
        return "N/A".to_string();
    };

    if price < lower {
        "Below Lower Band".to_string()
    } else if price > upper {
        "Above Upper Band".to_string()
    } else {
        "Inside Bands".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn summary_splits_named_and_extra_indicators() {
        let snapshot = MarketSnapshot::new("EURUSD", dec!(1.0790))
            .with_indicator(indicator::RSI, 28.4)
            .with_indicator(indicator::ATR, 0.0011)
            .with_indicator(indicator::BB_LOWER, 1.0800)
            .with_indicator(indicator::BB_UPPER, 1.0900)
            .with_indicator(indicator::EMA_50, 1.0850)
            .with_trend("Bearish");

        let summary = SnapshotSummarizer.summarize(&snapshot);
        assert_eq!(summary.rsi, Some(28.4));
        assert_eq!(summary.macd, None);
        assert_eq!(summary.bb_status, "Below Lower Band");
        assert_eq!(summary.trend, "Bearish");
        assert_eq!(summary.extra.len(), 1);
        assert!(summary.extra.contains_key(indicator::EMA_50));
    }

    #[test]
    fn bands_missing_is_na() {
        let snapshot = MarketSnapshot::new("EURUSD", dec!(1.08));
        assert_eq!(SnapshotSummarizer.summarize(&snapshot).bb_status, "N/A");
    }
}
