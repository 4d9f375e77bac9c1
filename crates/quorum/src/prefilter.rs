//! Cheap indicator screen run before any expert is consulted.
//!
//! Each trigger votes for a direction and adds a fixed weight. Two triggers
//! pointing opposite ways cancel the candidate for the rest of the
//! evaluation, so consensus is only requested for unambiguous setups.

use chrono::Utc;
use quorum_models::snapshot::indicator;
use quorum_models::{Action, CandidateSignal, MarketSnapshot};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;

/// Weight of an RSI or Bollinger trigger.
const VOTE_WEIGHT: Decimal = Decimal::from_parts(3, 0, 0, false, 1);
/// Added when the EMA stack agrees with the candidate direction.
const TREND_BONUS: Decimal = Decimal::from_parts(2, 0, 0, false, 1);
/// Added to every emitted candidate.
const BASE_BOOST: Decimal = Decimal::from_parts(2, 0, 0, false, 1);
const MAX_CONFIDENCE: Decimal = Decimal::from_parts(99, 0, 0, false, 2);

#[derive(Default)]
struct Tally {
    direction: Option<Action>,
    conflicted: bool,
    confidence: Decimal,
    triggers: Vec<String>,
}

impl Tally {
    fn vote(&mut self, action: Action, trigger: String) {
        self.confidence += VOTE_WEIGHT;
        self.triggers.push(trigger);
        if self.conflicted {
            return;
        }
        match self.direction {
            None => self.direction = Some(action),
            Some(current) if current != action => {
                self.direction = None;
                self.conflicted = true;
            }
            Some(_) => {}
        }
    }
}

/// Screen one snapshot. Returns a candidate only when the triggers agree on a
/// direction and their combined weight reaches `threshold`. Snapshots without
/// an RSI reading (indicator warm-up) never produce a candidate.
pub fn check_signal(snapshot: &MarketSnapshot, threshold: Decimal) -> Option<CandidateSignal> {
    let rsi = snapshot.indicator(indicator::RSI)?;
    let price = snapshot.price.to_f64()?;
    let mut tally = Tally::default();

    if rsi < RSI_OVERSOLD {
        tally.vote(Action::Buy, format!("RSI Oversold ({rsi:.1})"));
    } else if rsi > RSI_OVERBOUGHT {
        tally.vote(Action::Sell, format!("RSI Overbought ({rsi:.1})"));
    }

    if let Some(lower) = snapshot.indicator(indicator::BB_LOWER) {
        if price < lower {
            tally.vote(Action::Buy, "Price below lower Bollinger band".to_string());
        }
    }
    if let Some(upper) = snapshot.indicator(indicator::BB_UPPER) {
        if price > upper {
            tally.vote(Action::Sell, "Price above upper Bollinger band".to_string());
        }
    }

    if let (Some(ema_50), Some(ema_200)) = (
        snapshot.indicator(indicator::EMA_50),
        snapshot.indicator(indicator::EMA_200),
    ) {
        if price > ema_50 && ema_50 > ema_200 {
            tally
                .triggers
                .push("Price above EMA 50 & 200 (Bullish Trend)".to_string());
            if tally.direction == Some(Action::Buy) {
                tally.confidence += TREND_BONUS;
            }
        } else if price < ema_50 && ema_50 < ema_200 {
            tally
                .triggers
                .push("Price below EMA 50 & 200 (Bearish Trend)".to_string());
            if tally.direction == Some(Action::Sell) {
                tally.confidence += TREND_BONUS;
            }
        }
    }

    let action = tally.direction?;
    if tally.confidence < threshold {
        return None;
    }

    Some(CandidateSignal {
        symbol: snapshot.symbol.clone(),
        action,
        confidence: (tally.confidence + BASE_BOOST).min(MAX_CONFIDENCE),
        price: snapshot.price,
        triggers: tally.triggers.join(" + "),
        detected_at: snapshot.captured_at.unwrap_or_else(Utc::now),
    })
}
