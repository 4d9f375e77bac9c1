use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical agent roles. The serialized names are the keys used in the
/// `[models]` configuration table and in reassignment reports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    TechnicalExpert,
    FundamentalExpert,
    SentimentExpert,
    RiskManager,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::TechnicalExpert,
        Role::FundamentalExpert,
        Role::SentimentExpert,
        Role::RiskManager,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::TechnicalExpert => "TechnicalExpert",
            Role::FundamentalExpert => "FundamentalExpert",
            Role::SentimentExpert => "SentimentExpert",
            Role::RiskManager => "RiskManager",
        }
    }

    /// Model used when the configuration has no usable entry for this role.
    pub fn default_model(&self) -> &'static str {
        match self {
            Role::FundamentalExpert => "gemini-1.5-pro",
            Role::TechnicalExpert | Role::SentimentExpert | Role::RiskManager => "gemini-1.5-flash",
        }
    }

    pub fn from_key(key: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|r| r.as_str() == key)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete provider/model pair a role is currently bound to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelSelection {
    pub provider: String,
    pub model: String,
}

impl ModelSelection {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_keys_roundtrip() {
        for role in Role::ALL {
            assert_eq!(Role::from_key(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_key("Sentiment"), None);
    }

    #[test]
    fn serde_uses_config_keys() {
        let json = serde_json::to_string(&Role::RiskManager).unwrap();
        assert_eq!(json, "\"RiskManager\"");
    }
}
