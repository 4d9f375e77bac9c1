use std::sync::Arc;
use std::time::Instant;

use quorum_context::{MacroSource, NewsFeed, PerformanceSource, TechnicalSummarizer};
use quorum_models::{
    clamp_confidence, Action, AgentsConfig, Breakdown, Decision, GovernorConfig, MarketSnapshot,
    RiskOpinion, RiskParameters,
};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::AgentError;
use crate::expert::{
    ExpertAgent, FundamentalExpert, RiskExpert, RiskInput, SentimentExpert, TechnicalExpert,
    NO_REASONING,
};
use crate::gateway::ProviderGateway;
use crate::governor::Governor;
use crate::parser::{decimal_field, integer_field, parse_object, text_field};
use crate::prompts::synthesis_prompt;
use crate::registry::{ModelRegistry, ReassignmentReport};

/// External data sources consulted once per consensus cycle.
#[derive(Clone)]
pub struct Collaborators {
    pub summarizer: Arc<dyn TechnicalSummarizer>,
    pub macro_source: Arc<dyn MacroSource>,
    pub news: Arc<dyn NewsFeed>,
    pub performance: Arc<dyn PerformanceSource>,
}

/// Decision fields read from the synthesis answer.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAnswer {
    pub action: Action,
    pub confidence: Decimal,
    pub reasoning: String,
    pub risk_parameters: RiskParameters,
}

/// Runs the four experts concurrently and reduces their opinions to one decision.
pub struct ConsensusSynthesizer {
    technical: ExpertAgent<TechnicalExpert>,
    fundamental: ExpertAgent<FundamentalExpert>,
    sentiment: ExpertAgent<SentimentExpert>,
    risk: ExpertAgent<RiskExpert>,
    collaborators: Collaborators,
    registry: ModelRegistry,
    memory_trades: usize,
}

impl ConsensusSynthesizer {
    pub fn new(
        gateway: Arc<ProviderGateway>,
        registry: ModelRegistry,
        collaborators: Collaborators,
        agents: &AgentsConfig,
        governor: &GovernorConfig,
    ) -> Self {
        let governed = || Governor::from_config(governor);
        Self {
            technical: ExpertAgent::new(TechnicalExpert, Arc::clone(&gateway), registry.clone(), governed()),
            fundamental: ExpertAgent::new(
                FundamentalExpert::new(agents.macro_context_chars),
                Arc::clone(&gateway),
                registry.clone(),
                governed(),
            ),
            sentiment: ExpertAgent::new(SentimentExpert, Arc::clone(&gateway), registry.clone(), governed()),
            risk: ExpertAgent::new(RiskExpert, gateway, registry.clone(), governed()),
            collaborators,
            registry,
            memory_trades: agents.memory_trades,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Reassign every agent to `model`.
    pub fn set_all(&self, model: &str) -> ReassignmentReport {
        self.registry.set_all(model)
    }

    /// Produce one decision for `symbol`. Never fails: the worst outcome is the
    /// fixed HOLD fallback. The breakdown of all four opinions is always attached.
    pub async fn get_consensus(
        &mut self,
        symbol: &str,
        snapshot: &MarketSnapshot,
        news: Option<Vec<String>>,
    ) -> Decision {
        let started = Instant::now();
        info!(symbol, "Starting consensus");

        let collaborators = &self.collaborators;
        let (news, macro_context, memory) = tokio::join!(
            async {
                match news {
                    Some(items) => items,
                    None => collaborators.news.fetch_news().await.unwrap_or_else(|e| {
                        warn!(symbol, error = %e, "News unavailable, continuing without");
                        Vec::new()
                    }),
                }
            },
            async {
                collaborators.macro_source.summary_context().await.unwrap_or_else(|e| {
                    warn!(symbol, error = %e, "Macro context unavailable");
                    String::new()
                })
            },
            collaborators.performance.recent_performance(symbol, self.memory_trades),
        );

        let mut summary = collaborators.summarizer.summarize(snapshot);
        summary.symbol = symbol.to_string();
        let risk_input = RiskInput {
            atr: summary.atr,
            price_action: summary.trend.clone(),
        };

        let (technical, fundamental, sentiment, risk) = tokio::join!(
            self.technical.analyze(&summary),
            self.fundamental.analyze(macro_context.as_str()),
            self.sentiment.analyze(news.as_slice()),
            self.risk.analyze(&risk_input),
        );

        let breakdown = Breakdown {
            technical,
            fundamental,
            sentiment,
            risk,
            memory,
        };

        let prompt = synthesis_prompt(symbol, &breakdown);
        let answer = self.technical.call(&prompt).await.and_then(|text| {
            let fields = parse_object(&text).map_err(|e| AgentError::Parse(e.to_string()))?;
            read_synthesis(&fields, &breakdown.risk)
        });

        let mut decision = match answer {
            Ok(answer) => Decision::new(
                symbol,
                answer.action,
                answer.confidence,
                answer.reasoning,
                answer.risk_parameters,
                breakdown,
            ),
            Err(e) => {
                warn!(symbol, error = %e, cause = e.diagnostic(), "Synthesis failed, holding");
                Decision::fallback(symbol, breakdown)
            }
        };
        decision.processing_time_ms = started.elapsed().as_millis() as u64;

        info!(
            symbol,
            action = %decision.action,
            confidence = %decision.confidence,
            elapsed_ms = decision.processing_time_ms,
            "Consensus complete"
        );
        decision
    }
}

/// Read the synthesis answer. A missing or unrecognised action is a parse
/// failure; other missing fields default, risk limits from the risk opinion.
pub fn read_synthesis(
    fields: &Map<String, Value>,
    risk: &RiskOpinion,
) -> Result<SynthesizedAnswer, AgentError> {
    let action = text_field(fields, "action")
        .and_then(Action::parse)
        .ok_or_else(|| AgentError::Parse("synthesis answer has no valid action".to_string()))?;

    let params = fields.get("risk_parameters").and_then(Value::as_object);
    let leverage = params
        .and_then(|p| integer_field(p, "leverage"))
        .map(|leverage| leverage.max(1))
        .unwrap_or(risk.max_leverage);
    let stop_loss = params
        .and_then(|p| text_field(p, "stop_loss"))
        .unwrap_or(risk.stop_loss_advice.as_str())
        .to_string();

    Ok(SynthesizedAnswer {
        action,
        confidence: clamp_confidence(decimal_field(fields, "confidence").unwrap_or(Decimal::ZERO)),
        reasoning: text_field(fields, "reasoning").unwrap_or(NO_REASONING).to_string(),
        risk_parameters: RiskParameters {
            leverage,
            stop_loss,
        },
    })
}
