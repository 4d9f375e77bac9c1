use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use quorum_models::{CatalogEntry, ModelSelection, QuorumConfig, Role};
use serde::Serialize;
use tracing::{info, warn};

use crate::gateway::ProviderGateway;

/// Outcome of reassigning every role to one model.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReassignmentReport {
    pub success: bool,
    pub details: BTreeMap<Role, bool>,
    pub message: String,
}

/// Role → provider/model mapping shared by all agents.
///
/// Agents read their selection at call time, so a reassignment applies on the
/// next call without a restart. Cloning shares the same underlying map.
#[derive(Clone)]
pub struct ModelRegistry {
    selections: Arc<RwLock<BTreeMap<Role, ModelSelection>>>,
    catalog: Arc<Vec<CatalogEntry>>,
    gateway: Arc<ProviderGateway>,
}

impl ModelRegistry {
    pub fn new(
        selections: BTreeMap<Role, ModelSelection>,
        catalog: Vec<CatalogEntry>,
        gateway: Arc<ProviderGateway>,
    ) -> Self {
        Self {
            selections: Arc::new(RwLock::new(selections)),
            catalog: Arc::new(catalog),
            gateway,
        }
    }

    /// Startup mapping: the configured model per role, defaults where absent.
    pub fn from_config(config: &QuorumConfig, gateway: Arc<ProviderGateway>) -> Self {
        let selections = Role::ALL
            .into_iter()
            .map(|role| (role, config.selection_for(role)))
            .collect();
        Self::new(selections, config.catalog.clone(), gateway)
    }

    pub fn get(&self, role: Role) -> ModelSelection {
        let selections = self.selections.read().unwrap_or_else(PoisonError::into_inner);
        selections
            .get(&role)
            .cloned()
            .unwrap_or_else(|| self.resolve(role.default_model(), None))
    }

    /// Current mapping for every role.
    pub fn snapshot(&self) -> BTreeMap<Role, ModelSelection> {
        self.selections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Point one role at `model`. Returns true if the role now uses it
    /// (including when it already did), false if its provider has no credential.
    pub fn reassign(&self, role: Role, model: &str) -> bool {
        let mut selections = self.selections.write().unwrap_or_else(PoisonError::into_inner);
        let current = selections.get(&role).cloned();
        let target = self.resolve(model, current.as_ref().map(|s| s.provider.as_str()));

        if current.as_ref() == Some(&target) {
            return true;
        }
        if !self.gateway.has_credential(&target.provider) {
            warn!(agent = %role, provider = %target.provider, model, "Cannot reassign, provider has no credential");
            return false;
        }

        info!(agent = %role, provider = %target.provider, model, "Model reassigned");
        selections.insert(role, target);
        true
    }

    /// Reassign every role to `model`. One role failing does not stop the others.
    pub fn set_all(&self, model: &str) -> ReassignmentReport {
        info!(model, "Switching all agents");
        let details: BTreeMap<Role, bool> = Role::ALL
            .into_iter()
            .map(|role| (role, self.reassign(role, model)))
            .collect();

        let updated = details.values().filter(|ok| **ok).count();
        ReassignmentReport {
            success: updated > 0,
            message: format!("Updated {updated}/{} agents to {model}", details.len()),
            details,
        }
    }

    /// Catalog entries whose provider currently has a credential.
    pub fn list_available(&self) -> Vec<CatalogEntry> {
        self.catalog
            .iter()
            .filter(|entry| self.gateway.has_credential(&entry.provider))
            .cloned()
            .collect()
    }

    /// Provider for `model` from the catalog, else the role's current provider.
    fn resolve(&self, model: &str, current_provider: Option<&str>) -> ModelSelection {
        let provider = self
            .catalog
            .iter()
            .find(|entry| entry.id == model)
            .map(|entry| entry.provider.as_str())
            .or(current_provider)
            .unwrap_or_default();
        ModelSelection::new(provider, model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedProvider;
    use std::time::Duration;

    fn catalog() -> Vec<CatalogEntry> {
        [
            ("gemini-1.5-flash", "gemini"),
            ("gemini-1.5-pro", "gemini"),
            ("llama3", "ollama"),
            ("gpt-4o", "openai"),
        ]
        .into_iter()
        .map(|(id, provider)| CatalogEntry {
            id: id.to_string(),
            provider: provider.to_string(),
        })
        .collect()
    }

    fn registry_with(credentialed: &[&str]) -> ModelRegistry {
        let mut gateway = ProviderGateway::new(Duration::from_secs(5));
        for id in credentialed {
            gateway = gateway.with_provider(*id, Arc::new(ScriptedProvider::always("{}")));
        }
        let selections = Role::ALL
            .into_iter()
            .map(|role| (role, ModelSelection::new("gemini", role.default_model())))
            .collect();
        ModelRegistry::new(selections, catalog(), Arc::new(gateway))
    }

    #[test]
    fn get_returns_configured_selection() {
        let registry = registry_with(&["gemini"]);
        assert_eq!(
            registry.get(Role::FundamentalExpert),
            ModelSelection::new("gemini", "gemini-1.5-pro")
        );
    }

    #[test]
    fn set_all_switches_provider_through_catalog() {
        let registry = registry_with(&["gemini", "ollama"]);
        let report = registry.set_all("llama3");

        assert!(report.success);
        assert!(report.details.values().all(|ok| *ok));
        assert_eq!(report.message, "Updated 4/4 agents to llama3");
        for role in Role::ALL {
            assert_eq!(registry.get(role), ModelSelection::new("ollama", "llama3"));
        }
    }

    #[test]
    fn uncredentialed_provider_leaves_selection_unchanged() {
        let registry = registry_with(&["gemini"]);
        let report = registry.set_all("gpt-4o");

        assert!(!report.success);
        assert_eq!(report.message, "Updated 0/4 agents to gpt-4o");
        assert!(report.details.values().all(|ok| !*ok));
        assert_eq!(
            registry.get(Role::TechnicalExpert),
            ModelSelection::new("gemini", "gemini-1.5-flash")
        );
    }

    #[test]
    fn reassign_is_idempotent() {
        let registry = registry_with(&[]);
        // Unchanged selection succeeds even without a credential.
        assert!(registry.reassign(Role::TechnicalExpert, "gemini-1.5-flash"));
        assert!(!registry.reassign(Role::TechnicalExpert, "gemini-1.5-pro"));
    }

    #[test]
    fn unknown_model_keeps_current_provider() {
        let registry = registry_with(&["gemini"]);
        assert!(registry.reassign(Role::SentimentExpert, "gemini-2.0-flash-exp"));
        assert_eq!(
            registry.get(Role::SentimentExpert),
            ModelSelection::new("gemini", "gemini-2.0-flash-exp")
        );
    }

    #[test]
    fn list_available_filters_by_credential() {
        let registry = registry_with(&["ollama"]);
        let ids: Vec<String> = registry.list_available().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["llama3"]);
    }

    #[test]
    fn clones_share_state() {
        let registry = registry_with(&["gemini", "ollama"]);
        let handle = registry.clone();
        handle.set_all("llama3");
        assert_eq!(registry.get(Role::RiskManager).model, "llama3");
    }

    #[test]
    fn report_serializes_role_keys() {
        let registry = registry_with(&["gemini"]);
        let json = serde_json::to_value(registry.set_all("gemini-1.5-pro")).unwrap();
        assert_eq!(json["details"]["TechnicalExpert"], true);
        assert_eq!(json["success"], true);
    }
}
