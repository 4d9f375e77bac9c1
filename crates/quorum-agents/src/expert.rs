use std::sync::Arc;
use std::time::Instant;

use quorum_models::opinion::{DEFAULT_MAX_LEVERAGE, DEFAULT_STOP_LOSS_ADVICE};
use quorum_models::{
    clamp_confidence, DirectionalOpinion, RiskOpinion, Role, TechnicalSummary, VolatilityRegime,
};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::gateway::ProviderGateway;
use crate::governor::{GateState, Governor};
use crate::parser::{decimal_field, integer_field, parse_object, text_field};
use crate::prompts;
use crate::registry::ModelRegistry;

pub const NO_REASONING: &str = "No reasoning provided";
pub const NO_MACRO_DATA: &str = "No macro data available";

/// Macro context shorter than this is treated as absent.
const MIN_MACRO_CHARS: usize = 10;

/// Role-specific half of an agent: how to prompt, how to read the answer,
/// and what to say when there is no answer.
pub trait Expert: Send + Sync {
    type Input: Send + Sync + ?Sized;
    type Opinion: Send;

    const ROLE: Role;

    /// An opinion that makes the provider call unnecessary, if any.
    fn precheck(&self, _input: &Self::Input) -> Option<Self::Opinion> {
        None
    }

    fn prompt(&self, input: &Self::Input) -> String;

    /// Typed opinion from the parsed answer, defaulting missing fields.
    fn interpret(&self, fields: &Map<String, Value>) -> Self::Opinion;

    /// Safe default carrying the failure cause.
    fn fallback(&self, cause: &str) -> Self::Opinion;
}

/// An expert bound to the gateway, the shared registry and its own governor.
///
/// The governor is owned outright; nothing else reads or writes it, so one
/// agent's backoff never delays another agent's calls.
pub struct ExpertAgent<E: Expert> {
    expert: E,
    gateway: Arc<ProviderGateway>,
    registry: ModelRegistry,
    governor: Governor,
}

impl<E: Expert> ExpertAgent<E> {
    pub fn new(expert: E, gateway: Arc<ProviderGateway>, registry: ModelRegistry, governor: Governor) -> Self {
        Self {
            expert,
            gateway,
            registry,
            governor,
        }
    }

    pub fn governor(&self) -> &Governor {
        &self.governor
    }

    /// Produce this role's opinion. Never fails: every failure becomes the
    /// role's default opinion with a diagnostic reasoning string.
    pub async fn analyze(&mut self, input: &E::Input) -> E::Opinion {
        if let Some(opinion) = self.expert.precheck(input) {
            debug!(agent = %E::ROLE, "Answered without provider call");
            return opinion;
        }

        let prompt = self.expert.prompt(input);
        match self.call(&prompt).await.and_then(|text| {
            parse_object(&text).map_err(|e| AgentError::Parse(e.to_string()))
        }) {
            Ok(fields) => self.expert.interpret(&fields),
            Err(e) => {
                warn!(agent = %E::ROLE, error = %e, "Using default opinion");
                self.expert.fallback(e.diagnostic())
            }
        }
    }

    /// One governed provider call with the role's current model selection.
    ///
    /// While cooling the gateway is not touched at all. A transport success
    /// resets the backoff even if the text turns out to be empty.
    pub async fn call(&mut self, prompt: &str) -> Result<String, AgentError> {
        if let GateState::Cooling { remaining } = self.governor.gate(Instant::now()) {
            warn!(agent = %E::ROLE, remaining_secs = remaining.as_secs(), "Cooling down, call skipped");
            return Err(AgentError::Cooling(remaining));
        }

        let selection = self.registry.get(E::ROLE);
        let started = Instant::now();
        match self
            .gateway
            .invoke(&selection.provider, &selection.model, prompt)
            .await
        {
            Ok(text) => {
                self.governor.record_success();
                debug!(
                    agent = %E::ROLE,
                    model = %selection.model,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Provider answered"
                );
                if text.trim().is_empty() {
                    return Err(AgentError::EmptyResponse);
                }
                Ok(text)
            }
            Err(e) => {
                if let Some(backoff) = self.governor.record_failure(&e, Instant::now()) {
                    warn!(
                        agent = %E::ROLE,
                        provider = %selection.provider,
                        consecutive_errors = self.governor.consecutive_errors(),
                        backoff_secs = backoff.as_secs(),
                        "Rate limited, backing off"
                    );
                }
                Err(e.into())
            }
        }
    }

    /// Point this role at another model. Idempotent if the model is unchanged.
    pub fn reassign_model(&self, model: &str) -> bool {
        self.registry.reassign(E::ROLE, model)
    }
}

fn directional(role: Role, key: &str, fields: &Map<String, Value>) -> DirectionalOpinion {
    let stance = text_field(fields, key)
        .or_else(|| text_field(fields, "signal"))
        .map(|label| prompts::parse_stance(role, label))
        .unwrap_or_default();
    let confidence = decimal_field(fields, "confidence").unwrap_or(Decimal::ZERO);
    let reasoning = text_field(fields, "reasoning").unwrap_or(NO_REASONING);
    DirectionalOpinion::new(stance, clamp_confidence(confidence), reasoning)
}

/// Chart and indicator reading.
#[derive(Debug, Default, Clone, Copy)]
pub struct TechnicalExpert;

impl Expert for TechnicalExpert {
    type Input = TechnicalSummary;
    type Opinion = DirectionalOpinion;

    const ROLE: Role = Role::TechnicalExpert;

    fn prompt(&self, input: &TechnicalSummary) -> String {
        prompts::technical_prompt(input)
    }

    fn interpret(&self, fields: &Map<String, Value>) -> DirectionalOpinion {
        directional(Self::ROLE, "signal", fields)
    }

    fn fallback(&self, cause: &str) -> DirectionalOpinion {
        DirectionalOpinion::neutral(Decimal::ZERO, cause)
    }
}

/// Macro bias from research notes.
#[derive(Debug, Clone, Copy)]
pub struct FundamentalExpert {
    max_context_chars: usize,
}

impl Default for FundamentalExpert {
    fn default() -> Self {
        Self::new(5000)
    }
}

impl FundamentalExpert {
    pub fn new(max_context_chars: usize) -> Self {
        Self { max_context_chars }
    }
}

impl Expert for FundamentalExpert {
    type Input = str;
    type Opinion = DirectionalOpinion;

    const ROLE: Role = Role::FundamentalExpert;

    fn precheck(&self, input: &str) -> Option<DirectionalOpinion> {
        (input.trim().chars().count() < MIN_MACRO_CHARS)
            .then(|| DirectionalOpinion::neutral(Decimal::new(5, 1), NO_MACRO_DATA))
    }

    fn prompt(&self, input: &str) -> String {
        let truncated: String = input.chars().take(self.max_context_chars).collect();
        prompts::fundamental_prompt(&truncated)
    }

    fn interpret(&self, fields: &Map<String, Value>) -> DirectionalOpinion {
        directional(Self::ROLE, "bias", fields)
    }

    fn fallback(&self, cause: &str) -> DirectionalOpinion {
        DirectionalOpinion::neutral(Decimal::ZERO, cause)
    }
}

/// Market mood from headlines.
#[derive(Debug, Default, Clone, Copy)]
pub struct SentimentExpert;

impl Expert for SentimentExpert {
    type Input = [String];
    type Opinion = DirectionalOpinion;

    const ROLE: Role = Role::SentimentExpert;

    fn prompt(&self, input: &[String]) -> String {
        prompts::sentiment_prompt(input)
    }

    fn interpret(&self, fields: &Map<String, Value>) -> DirectionalOpinion {
        directional(Self::ROLE, "sentiment", fields)
    }

    fn fallback(&self, cause: &str) -> DirectionalOpinion {
        DirectionalOpinion::neutral(Decimal::ZERO, cause)
    }
}

/// What the risk manager looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskInput {
    pub atr: Option<f64>,
    pub price_action: String,
}

/// Volatility regime and exposure limits.
#[derive(Debug, Default, Clone, Copy)]
pub struct RiskExpert;

impl Expert for RiskExpert {
    type Input = RiskInput;
    type Opinion = RiskOpinion;

    const ROLE: Role = Role::RiskManager;

    fn prompt(&self, input: &RiskInput) -> String {
        prompts::risk_prompt(input.atr, &input.price_action)
    }

    fn interpret(&self, fields: &Map<String, Value>) -> RiskOpinion {
        RiskOpinion {
            regime: text_field(fields, "regime")
                .and_then(VolatilityRegime::parse)
                .unwrap_or_default(),
            max_leverage: integer_field(fields, "max_leverage")
                .map(|leverage| leverage.max(1))
                .unwrap_or(DEFAULT_MAX_LEVERAGE),
            stop_loss_advice: text_field(fields, "stop_loss_advice")
                .unwrap_or(DEFAULT_STOP_LOSS_ADVICE)
                .to_string(),
            note: None,
        }
    }

    fn fallback(&self, cause: &str) -> RiskOpinion {
        RiskOpinion::fallback(cause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::test_support::ScriptedProvider;
    use quorum_models::{ModelSelection, Stance};
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn build_agent<E: Expert>(expert: E, provider: Arc<ScriptedProvider>) -> ExpertAgent<E> {
        build_governed(expert, provider, Governor::default())
    }

    fn build_governed<E: Expert>(
        expert: E,
        provider: Arc<ScriptedProvider>,
        governor: Governor,
    ) -> ExpertAgent<E> {
        let gateway = Arc::new(ProviderGateway::new(Duration::from_secs(5)).with_provider("mock", provider));
        let selections: BTreeMap<Role, ModelSelection> = Role::ALL
            .into_iter()
            .map(|role| (role, ModelSelection::new("mock", "mock-model")))
            .collect();
        let registry = ModelRegistry::new(selections, Vec::new(), Arc::clone(&gateway));
        ExpertAgent::new(expert, gateway, registry, governor)
    }

    fn fields(json: &str) -> Map<String, Value> {
        parse_object(json).unwrap()
    }

    #[tokio::test]
    async fn technical_opinion_from_fenced_answer() {
        let provider = Arc::new(ScriptedProvider::always(
            "```json\n{\"signal\": \"BUY\", \"confidence\": 0.8, \"reasoning\": \"RSI divergence\"}\n```",
        ));
        let mut agent = build_agent(TechnicalExpert, provider);
        let opinion = agent.analyze(&TechnicalSummary::default()).await;
        assert_eq!(opinion, DirectionalOpinion::new(Stance::Up, dec!(0.8), "RSI divergence"));
    }

    #[tokio::test]
    async fn missing_fields_take_defaults() {
        let opinion = SentimentExpert.interpret(&fields(r#"{"sentiment": "RISK_OFF"}"#));
        assert_eq!(opinion.stance, Stance::Down);
        assert_eq!(opinion.confidence, Decimal::ZERO);
        assert_eq!(opinion.reasoning, NO_REASONING);

        let opinion = TechnicalExpert.interpret(&fields(r#"{"signal": "MOON", "confidence": "7"}"#));
        assert_eq!(opinion.stance, Stance::Neutral);
        assert_eq!(opinion.confidence, Decimal::ONE);
    }

    #[test]
    fn risk_opinion_accepts_string_leverage() {
        let opinion = RiskExpert.interpret(&fields(
            r#"{"regime": "HIGH_VOL", "max_leverage": "Integer (e.g., 10)", "stop_loss_advice": "Wide"}"#,
        ));
        assert_eq!(opinion.regime, VolatilityRegime::HighVol);
        assert_eq!(opinion.max_leverage, 10);
        assert_eq!(opinion.stop_loss_advice, "Wide");
        assert_eq!(opinion.note, None);

        let opinion = RiskExpert.interpret(&fields(r#"{"max_leverage": 0}"#));
        assert_eq!(opinion.max_leverage, 1);
        assert_eq!(opinion.regime, VolatilityRegime::Normal);
    }

    #[tokio::test]
    async fn fundamental_skips_call_without_macro_data() {
        let provider = Arc::new(ScriptedProvider::always("{}"));
        let mut agent = build_agent(FundamentalExpert::default(), Arc::clone(&provider));

        let opinion = agent.analyze("  short ").await;
        assert_eq!(opinion, DirectionalOpinion::neutral(dec!(0.5), NO_MACRO_DATA));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn fundamental_prompt_is_truncated() {
        let provider = Arc::new(ScriptedProvider::always(r#"{"bias": "BULLISH", "confidence": 0.6}"#));
        let mut agent = build_agent(FundamentalExpert::new(50), Arc::clone(&provider));

        let macro_text = "z".repeat(400);
        let opinion = agent.analyze(&macro_text).await;
        assert_eq!(opinion.stance, Stance::Up);
        assert_eq!(provider.prompts()[0].matches('z').count(), 50);
    }

    #[tokio::test]
    async fn failures_become_diagnostic_defaults() {
        let cases = [
            (ProviderError::AuthMissing("gemini".into()), "No Credentials"),
            (ProviderError::RateLimited("429".into()), "Rate Limited"),
            (ProviderError::Transient("503".into()), "LLM Failed"),
        ];
        for (error, diagnostic) in cases {
            let mut agent = build_agent(SentimentExpert, Arc::new(ScriptedProvider::failing(error)));
            let opinion = agent.analyze(&[]).await;
            assert_eq!(opinion, DirectionalOpinion::neutral(Decimal::ZERO, diagnostic));
        }

        let mut agent = build_agent(RiskExpert, Arc::new(ScriptedProvider::always("not json at all")));
        let input = RiskInput {
            atr: Some(0.0012),
            price_action: "Bullish".to_string(),
        };
        assert_eq!(agent.analyze(&input).await, RiskOpinion::fallback("Parse Failed"));

        let mut agent = build_agent(TechnicalExpert, Arc::new(ScriptedProvider::always("   ")));
        let opinion = agent.analyze(&TechnicalSummary::default()).await;
        assert_eq!(opinion.reasoning, "Empty Response");
    }

    #[tokio::test]
    async fn cooling_agent_never_reaches_gateway() {
        let provider = Arc::new(ScriptedProvider::failing(ProviderError::RateLimited("429".into())));
        let mut agent = build_agent(TechnicalExpert, Arc::clone(&provider));

        let first = agent.analyze(&TechnicalSummary::default()).await;
        assert_eq!(first.reasoning, "Rate Limited");
        assert_eq!(provider.calls(), 1);
        assert_eq!(agent.governor().consecutive_errors(), 1);

        for _ in 0..3 {
            let opinion = agent.analyze(&TechnicalSummary::default()).await;
            assert_eq!(opinion.reasoning, "Rate Limited");
        }
        assert_eq!(provider.calls(), 1);
        assert_eq!(agent.governor().consecutive_errors(), 1);
    }

    #[tokio::test]
    async fn empty_text_still_resets_backoff() {
        let provider = Arc::new(ScriptedProvider::sequence(vec![
            Err(ProviderError::RateLimited("429".into())),
            Ok(String::new()),
        ]));
        // Zero backoff so the cooldown has already expired on the next call.
        let governor = Governor::new(Duration::ZERO, Duration::ZERO);
        let mut agent = build_governed(TechnicalExpert, provider, governor);

        assert!(matches!(agent.call("p").await, Err(AgentError::Provider(_))));
        assert_eq!(agent.governor().consecutive_errors(), 1);

        assert!(matches!(agent.call("p").await, Err(AgentError::EmptyResponse)));
        assert_eq!(agent.governor().consecutive_errors(), 0);
    }

    #[tokio::test]
    async fn registry_change_applies_on_next_call() {
        let provider = Arc::new(ScriptedProvider::always(r#"{"signal": "SELL"}"#));
        let mut agent = build_agent(TechnicalExpert, Arc::clone(&provider));

        agent.analyze(&TechnicalSummary::default()).await;
        assert!(agent.reassign_model("mock-model-2"));
        agent.analyze(&TechnicalSummary::default()).await;

        assert_eq!(provider.models(), vec!["mock-model", "mock-model-2"]);
    }
}
