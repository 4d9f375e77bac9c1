use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::opinion::{clamp_confidence, Breakdown};

pub const SYNTHESIS_FAILED: &str = "Synthesis Failed";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Hold => "HOLD",
        }
    }

    /// Case-insensitive parse of BUY/SELL/HOLD.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "BUY" => Some(Action::Buy),
            "SELL" => Some(Action::Sell),
            "HOLD" => Some(Action::Hold),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RiskParameters {
    pub leverage: u32,
    pub stop_loss: String,
}

/// Final consensus for one symbol and one orchestration cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Decision {
    pub id: Uuid,
    pub symbol: String,
    pub action: Action,
    /// 0.0 to 1.0.
    pub confidence: Decimal,
    /// Never empty; names the failure cause when degraded.
    pub reasoning: String,
    pub risk_parameters: RiskParameters,
    pub breakdown: Breakdown,
    pub decided_at: DateTime<Utc>,
    pub processing_time_ms: u64,
}

impl Decision {
    pub fn new(
        symbol: &str,
        action: Action,
        confidence: Decimal,
        reasoning: impl Into<String>,
        risk_parameters: RiskParameters,
        breakdown: Breakdown,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            action,
            confidence: clamp_confidence(confidence),
            reasoning: reasoning.into(),
            risk_parameters,
            breakdown,
            decided_at: Utc::now(),
            processing_time_ms: 0,
        }
    }

    /// The fixed decision returned when synthesis cannot produce a usable answer.
    pub fn fallback(symbol: &str, breakdown: Breakdown) -> Self {
        Self::new(
            symbol,
            Action::Hold,
            Decimal::ZERO,
            SYNTHESIS_FAILED,
            RiskParameters {
                leverage: 1,
                stop_loss: "N/A".to_string(),
            },
            breakdown,
        )
    }

    pub fn is_fallback(&self) -> bool {
        self.action == Action::Hold
            && self.confidence.is_zero()
            && self.reasoning == SYNTHESIS_FAILED
    }
}
