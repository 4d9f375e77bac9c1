pub mod config;
pub mod decision;
pub mod opinion;
pub mod role;
pub mod signal;
pub mod snapshot;

pub use config::{
    AgentsConfig, CatalogEntry, ContextConfig, GovernorConfig, ProviderConfig, ProviderKind,
    QuorumConfig, RoleModels, SchedulerConfig,
};
pub use decision::{Action, Decision, RiskParameters, SYNTHESIS_FAILED};
pub use opinion::{
    clamp_confidence, Breakdown, DirectionalOpinion, RiskOpinion, Stance, VolatilityRegime,
};
pub use role::{ModelSelection, Role};
pub use signal::{CandidateSignal, PublishedSignal};
pub use snapshot::{MarketSnapshot, TechnicalSummary};
