pub mod error;
pub mod expert;
pub mod gateway;
pub mod governor;
pub mod parser;
pub mod prompts;
pub mod providers;
pub mod registry;
pub mod synthesizer;

pub mod test_support;

pub use error::{AgentError, ProviderError};
pub use expert::{
    Expert, ExpertAgent, FundamentalExpert, RiskExpert, RiskInput, SentimentExpert, TechnicalExpert,
};
pub use gateway::{Provider, ProviderGateway};
pub use governor::{GateState, Governor};
pub use parser::{parse_object, ParseFailed};
pub use registry::{ModelRegistry, ReassignmentReport};
pub use synthesizer::{read_synthesis, Collaborators, ConsensusSynthesizer, SynthesizedAnswer};
