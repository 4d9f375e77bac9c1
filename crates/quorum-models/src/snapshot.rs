use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Well-known indicator keys inside [`MarketSnapshot::indicators`].
pub mod indicator {
    pub const RSI: &str = "rsi";
    pub const MACD: &str = "macd";
    pub const MACD_SIGNAL: &str = "macd_signal";
    pub const MACD_HIST: &str = "macd_hist";
    pub const ATR: &str = "atr";
    pub const BB_LOWER: &str = "bb_lower";
    pub const BB_MIDDLE: &str = "bb_middle";
    pub const BB_UPPER: &str = "bb_upper";
    pub const EMA_50: &str = "ema_50";
    pub const EMA_200: &str = "ema_200";
}

/// Market state for one symbol, fixed for the duration of a consensus cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub price: Decimal,
    /// Indicator name -> latest value (e.g. "rsi", "macd", "atr").
    #[serde(default)]
    pub indicators: BTreeMap<String, f64>,
    /// Trend label such as "Bullish", "Bearish" or "Sideways".
    #[serde(default = "default_trend")]
    pub trend: String,
    #[serde(default)]
    pub captured_at: Option<DateTime<Utc>>,
}

fn default_trend() -> String {
    "Unknown".to_string()
}

impl MarketSnapshot {
    pub fn new(symbol: impl Into<String>, price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            indicators: BTreeMap::new(),
            trend: default_trend(),
            captured_at: None,
        }
    }

    pub fn with_indicator(mut self, name: &str, value: f64) -> Self {
        self.indicators.insert(name.to_string(), value);
        self
    }

    pub fn with_trend(mut self, trend: impl Into<String>) -> Self {
        self.trend = trend.into();
        self
    }

    /// Finite indicator value by key. NaN/inf readings (warm-up periods) count as absent.
    pub fn indicator(&self, name: &str) -> Option<f64> {
        self.indicators.get(name).copied().filter(|v| v.is_finite())
    }
}

/// Indicator digest handed to the technical and risk experts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TechnicalSummary {
    pub symbol: String,
    pub price: Decimal,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub atr: Option<f64>,
    /// Price position relative to the Bollinger bands.
    pub bb_status: String,
    pub trend: String,
    /// Indicators not covered by the named fields.
    #[serde(default)]
    pub extra: BTreeMap<String, f64>,
}
