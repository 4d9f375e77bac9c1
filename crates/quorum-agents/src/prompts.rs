use quorum_models::{Breakdown, DirectionalOpinion, Role, Stance, TechnicalSummary};

pub const NO_NEWS: &str = "No breaking news.";

/// Labels used for a stance outside any role's vocabulary.
const GENERIC_LABELS: (&str, &str) = ("UP", "DOWN");

/// Directional vocabulary a role answers in: (up, down). Neutral is always
/// `NEUTRAL`. The risk manager answers with a volatility regime and has none.
pub fn stance_labels(role: Role) -> Option<(&'static str, &'static str)> {
    match role {
        Role::TechnicalExpert => Some(("BUY", "SELL")),
        Role::FundamentalExpert => Some(("BULLISH", "BEARISH")),
        Role::SentimentExpert => Some(("RISK_ON", "RISK_OFF")),
        Role::RiskManager => None,
    }
}

pub fn stance_label(role: Role, stance: Stance) -> &'static str {
    let (up, down) = stance_labels(role).unwrap_or(GENERIC_LABELS);
    match stance {
        Stance::Up => up,
        Stance::Down => down,
        Stance::Neutral => "NEUTRAL",
    }
}

/// Map a label onto a stance. The role's own vocabulary is tried first, then
/// common synonyms; anything else is neutral.
pub fn parse_stance(role: Role, label: &str) -> Stance {
    let normalized = label.trim().to_ascii_uppercase().replace([' ', '-'], "_");
    let (up, down) = stance_labels(role).unwrap_or(GENERIC_LABELS);
    if normalized == up {
        return Stance::Up;
    }
    if normalized == down {
        return Stance::Down;
    }
    match normalized.as_str() {
        "BUY" | "LONG" | "BULLISH" | "RISK_ON" | "UP" => Stance::Up,
        "SELL" | "SHORT" | "BEARISH" | "RISK_OFF" | "DOWN" => Stance::Down,
        _ => Stance::Neutral,
    }
}

/// JSON answer shape appended to every prompt.
fn response_contract(example: serde_json::Value) -> String {
    format!(
        "Respond with ONLY a single JSON object, no prose, in this shape:\n{}",
        serde_json::to_string_pretty(&example).unwrap_or_default()
    )
}

fn directional_contract(role: Role, key: &str, reasoning_hint: &str) -> String {
    let (up, down) = stance_labels(role).unwrap_or(GENERIC_LABELS);
    response_contract(serde_json::json!({
        key: format!("{up} | {down} | NEUTRAL"),
        "confidence": "number between 0.0 and 1.0",
        "reasoning": reasoning_hint,
    }))
}

fn reading(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.5}"))
}

pub fn technical_prompt(summary: &TechnicalSummary) -> String {
    let extra: Vec<String> = summary
        .extra
        .iter()
        .map(|(name, value)| format!("- {name}: {value:.5}"))
        .collect();

    format!(
        "You are a veteran technical analyst on an FX desk. Read the indicator \
         snapshot below and call the primary trend and any chart pattern.\n\n\
         Symbol: {}\n\
         Price: {}\n\
         RSI: {}\n\
         MACD: {} (signal {}, histogram {})\n\
         ATR: {}\n\
         Bollinger position: {}\n\
         Trend (EMA): {}\n\
         {}\n\n\
         {}",
        summary.symbol,
        summary.price,
        reading(summary.rsi),
        reading(summary.macd),
        reading(summary.macd_signal),
        reading(summary.macd_hist),
        reading(summary.atr),
        summary.bb_status,
        summary.trend,
        if extra.is_empty() {
            String::new()
        } else {
            format!("Other indicators:\n{}", extra.join("\n"))
        },
        directional_contract(
            Role::TechnicalExpert,
            "signal",
            "brief technical explanation, e.g. RSI divergence confirmed by MACD cross",
        )
    )
}

/// `macro_context` must already be truncated by the caller.
pub fn fundamental_prompt(macro_context: &str) -> String {
    format!(
        "You are a global macro strategist. Review these research summaries:\n\n\
         {macro_context}\n\n\
         Determine the fundamental bias for the USD and the major currency pairs.\n\n\
         {}",
        directional_contract(
            Role::FundamentalExpert,
            "bias",
            "key point referencing the research, e.g. Fed minutes indicate a pause",
        )
    )
}

pub fn sentiment_prompt(news: &[String]) -> String {
    let content = if news.is_empty() {
        NO_NEWS.to_string()
    } else {
        news.join("\n")
    };
    format!(
        "You are a sentiment trader. Read the following headlines and notes:\n\n\
         {content}\n\n\
         Gauge the market mood: risk-on or risk-off.\n\n\
         {}",
        directional_contract(Role::SentimentExpert, "sentiment", "brief explanation of the mood")
    )
}

pub fn risk_prompt(atr: Option<f64>, price_action: &str) -> String {
    format!(
        "You are the desk's risk manager.\n\n\
         Volatility (ATR): {}\n\
         Price action: {price_action}\n\n\
         Recommend exposure limits for the next trade.\n\n\
         {}",
        reading(atr),
        response_contract(serde_json::json!({
            "regime": "LOW_VOL | NORMAL | HIGH_VOL | EXTREME",
            "max_leverage": "integer, e.g. 10, 50, 100",
            "stop_loss_advice": "Tight | Wide | No Trade",
        }))
    )
}

/// Final prompt combining memory and all four opinions. Labels, confidences
/// and reasoning are embedded exactly as the experts produced them.
pub fn synthesis_prompt(symbol: &str, breakdown: &Breakdown) -> String {
    let line = |role: Role, title: &str, opinion: &DirectionalOpinion| {
        format!(
            "[{title}]: {} ({}) - {}",
            stance_label(role, opinion.stance),
            opinion.confidence,
            opinion.reasoning
        )
    };

    format!(
        "You are the head trader. Weigh the reports from your desk together with \
         past performance and decide.\n\n\
         [Past Performance / Memory]:\n{}\n\n\
         {}\n{}\n{}\n\
         [Risk Manager]: Regime {}, Max Leverage {}, Advice: {}\n\n\
         Make the final trading decision for {symbol}. Cite the experts you rely on and be decisive.\n\n\
         {}",
        breakdown.memory,
        line(Role::TechnicalExpert, "Technical Analyst", &breakdown.technical),
        line(Role::FundamentalExpert, "Macro Strategist", &breakdown.fundamental),
        line(Role::SentimentExpert, "Sentiment", &breakdown.sentiment),
        breakdown.risk.regime.as_str(),
        breakdown.risk.max_leverage,
        breakdown.risk.stop_loss_advice,
        response_contract(serde_json::json!({
            "action": "BUY | SELL | HOLD",
            "confidence": "number between 0.0 and 1.0",
            "reasoning": "synthesized logic citing specific experts",
            "risk_parameters": { "leverage": "integer", "stop_loss": "string" },
        }))
    )
}
