use std::time::Duration;

use thiserror::Error;

/// Coarse classification of a failed provider call. The governor only
/// reacts to `RateLimited`; everything else is reported for this call only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("credential missing: {0}")]
    AuthMissing(String),

    #[error("transient provider failure: {0}")]
    Transient(String),

    #[error("provider error: {0}")]
    Unknown(String),
}

#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("agent cooling down for another {}s", .0.as_secs())]
    Cooling(Duration),

    #[error("provider returned an empty response")]
    EmptyResponse,

    #[error("response parse error: {0}")]
    Parse(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl AgentError {
    /// Short cause string carried in degraded opinions and decisions.
    pub fn diagnostic(&self) -> &'static str {
        match self {
            AgentError::Provider(ProviderError::AuthMissing(_)) => "No Credentials",
            AgentError::Provider(ProviderError::RateLimited(_)) | AgentError::Cooling(_) => {
                "Rate Limited"
            }
            AgentError::Provider(_) => "LLM Failed",
            AgentError::EmptyResponse => "Empty Response",
            AgentError::Parse(_) => "Parse Failed",
            AgentError::Config(_) => "Misconfigured",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_name_the_cause() {
        assert_eq!(
            AgentError::from(ProviderError::AuthMissing("gemini".into())).diagnostic(),
            "No Credentials"
        );
        assert_eq!(AgentError::Cooling(Duration::from_secs(3)).diagnostic(), "Rate Limited");
        assert_eq!(
            AgentError::from(ProviderError::Transient("503".into())).diagnostic(),
            "LLM Failed"
        );
        assert_eq!(AgentError::Parse("x".into()).diagnostic(), "Parse Failed");
        assert_eq!(AgentError::EmptyResponse.diagnostic(), "Empty Response");
        assert_eq!(AgentError::Config("no client".into()).diagnostic(), "Misconfigured");
    }
}
