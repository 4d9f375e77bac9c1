use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Directional call of an expert. Each role names these differently
/// (BUY/SELL, BULLISH/BEARISH, RISK_ON/RISK_OFF) but they collapse to this.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    Up,
    Down,
    #[default]
    Neutral,
}

/// Clamp a confidence value into [0, 1].
pub fn clamp_confidence(value: Decimal) -> Decimal {
    value.clamp(Decimal::ZERO, Decimal::ONE)
}

/// Opinion of the technical, fundamental or sentiment expert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DirectionalOpinion {
    pub stance: Stance,
    /// Always within [0, 1].
    pub confidence: Decimal,
    pub reasoning: String,
}

impl DirectionalOpinion {
    pub fn new(stance: Stance, confidence: Decimal, reasoning: impl Into<String>) -> Self {
        Self {
            stance,
            confidence: clamp_confidence(confidence),
            reasoning: reasoning.into(),
        }
    }

    pub fn neutral(confidence: Decimal, reasoning: impl Into<String>) -> Self {
        Self::new(Stance::Neutral, confidence, reasoning)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolatilityRegime {
    LowVol,
    #[default]
    Normal,
    HighVol,
    Extreme,
}

impl VolatilityRegime {
    pub fn as_str(&self) -> &'static str {
        match self {
            VolatilityRegime::LowVol => "LOW_VOL",
            VolatilityRegime::Normal => "NORMAL",
            VolatilityRegime::HighVol => "HIGH_VOL",
            VolatilityRegime::Extreme => "EXTREME",
        }
    }

    /// Lenient label parsing; unknown labels yield `None`.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().replace([' ', '-'], "_").as_str() {
            "LOW_VOL" | "LOW" => Some(VolatilityRegime::LowVol),
            "NORMAL" => Some(VolatilityRegime::Normal),
            "HIGH_VOL" | "HIGH" => Some(VolatilityRegime::HighVol),
            "EXTREME" => Some(VolatilityRegime::Extreme),
            _ => None,
        }
    }
}

pub const DEFAULT_MAX_LEVERAGE: u32 = 30;
pub const DEFAULT_STOP_LOSS_ADVICE: &str = "Standard";

/// Opinion of the risk manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskOpinion {
    pub regime: VolatilityRegime,
    /// At least 1.
    pub max_leverage: u32,
    pub stop_loss_advice: String,
    /// Diagnostic set when this is a default opinion rather than a model answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl RiskOpinion {
    pub fn fallback(note: impl Into<String>) -> Self {
        Self {
            regime: VolatilityRegime::Normal,
            max_leverage: DEFAULT_MAX_LEVERAGE,
            stop_loss_advice: DEFAULT_STOP_LOSS_ADVICE.to_string(),
            note: Some(note.into()),
        }
    }
}

/// All sub-opinions behind a decision, attached for downstream observability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Breakdown {
    pub technical: DirectionalOpinion,
    pub fundamental: DirectionalOpinion,
    pub sentiment: DirectionalOpinion,
    pub risk: RiskOpinion,
    pub memory: String,
}
