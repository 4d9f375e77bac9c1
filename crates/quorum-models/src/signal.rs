use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decision::{Action, Decision};

/// Output of the indicator pre-filter: a trade idea worth asking the experts about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateSignal {
    pub symbol: String,
    /// BUY or SELL; the pre-filter never proposes HOLD.
    pub action: Action,
    pub confidence: Decimal,
    pub price: Decimal,
    /// Triggers joined with " + ".
    pub triggers: String,
    pub detected_at: DateTime<Utc>,
}

/// A candidate confirmed by consensus, ready for downstream publication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublishedSignal {
    pub id: Uuid,
    pub symbol: String,
    pub action: Action,
    pub price: Decimal,
    /// Consensus confidence, replacing the pre-filter's.
    pub confidence: Decimal,
    pub triggers: String,
    pub reasoning: String,
    pub leverage: u32,
    pub decision_id: Uuid,
    pub published_at: DateTime<Utc>,
}

impl PublishedSignal {
    /// Merge a candidate with the consensus that confirmed it. The consensus
    /// action wins when it disagrees with the candidate's direction.
    pub fn from_consensus(candidate: &CandidateSignal, decision: &Decision) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: candidate.symbol.clone(),
            action: decision.action,
            price: candidate.price,
            confidence: decision.confidence,
            triggers: candidate.triggers.clone(),
            reasoning: decision.reasoning.clone(),
            leverage: decision.risk_parameters.leverage,
            decision_id: decision.id,
            published_at: Utc::now(),
        }
    }
}
