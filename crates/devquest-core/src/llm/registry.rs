//! Provider registry: the static catalog with availability computed once.
//!
//! Built a single time at startup (from configuration plus a credential
//! source) and shared read-only afterwards. Tests construct arbitrary
//! registries directly from descriptors.

use std::collections::HashSet;

use devquest_types::config::ProviderSpec;
use devquest_types::error::OrchestratorError;
use devquest_types::provider::ProviderDescriptor;

use super::credentials::CredentialSource;

/// Immutable catalog of providers in declaration order.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: Vec<ProviderDescriptor>,
}

impl ProviderRegistry {
    /// Build a registry from descriptors, validating catalog invariants.
    ///
    /// Fails with `InvalidRegistry` when an id is registered twice or an
    /// available provider declares no models.
    pub fn new(providers: Vec<ProviderDescriptor>) -> Result<Self, OrchestratorError> {
        let mut seen = HashSet::new();
        for provider in &providers {
            if !seen.insert(provider.id.as_str()) {
                return Err(OrchestratorError::InvalidRegistry(format!(
                    "duplicate provider id '{}'",
                    provider.id
                )));
            }
            if provider.available && provider.models.is_empty() {
                return Err(OrchestratorError::InvalidRegistry(format!(
                    "provider '{}' is available but declares no models",
                    provider.id
                )));
            }
        }
        Ok(Self { providers })
    }

    /// Build a registry from provider specs, marking each available when it
    /// is enabled and its credential is present.
    pub fn from_specs(
        specs: &[ProviderSpec],
        credentials: &dyn CredentialSource,
    ) -> Result<Self, OrchestratorError> {
        let providers = specs
            .iter()
            .map(|spec| {
                let available = spec.enabled && credentials.has(&spec.credential_key);
                tracing::debug!(
                    provider = %spec.id,
                    credential = %spec.credential_key,
                    available,
                    "Registered provider"
                );
                ProviderDescriptor {
                    id: spec.id.clone(),
                    display_name: spec.display_name.clone(),
                    models: spec.models.clone(),
                    available,
                    priority: spec.priority,
                    capabilities: spec.capabilities,
                }
            })
            .collect();
        Self::new(providers)
    }

    /// All registered providers, in declaration order.
    pub fn list(&self) -> &[ProviderDescriptor] {
        &self.providers
    }

    /// Available providers sorted by ascending priority.
    ///
    /// The sort is stable, so equal priorities keep declaration order.
    pub fn available(&self) -> Vec<&ProviderDescriptor> {
        let mut available: Vec<&ProviderDescriptor> =
            self.providers.iter().filter(|p| p.available).collect();
        available.sort_by_key(|p| p.priority);
        available
    }

    /// Look up a provider by id.
    pub fn get(&self, id: &str) -> Result<&ProviderDescriptor, OrchestratorError> {
        self.providers
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| OrchestratorError::UnknownProvider(id.to_string()))
    }

    pub fn has_available(&self) -> bool {
        self.providers.iter().any(|p| p.available)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::credentials::StaticCredentials;
    use crate::llm::testing::descriptor;
    use devquest_types::config::default_catalog;
    use devquest_types::provider::ProviderCapabilities;

    fn ids(providers: &[&ProviderDescriptor]) -> Vec<String> {
        providers.iter().map(|p| p.id.clone()).collect()
    }

    #[test]
    fn test_available_sorted_by_priority() {
        let registry = ProviderRegistry::new(vec![
            descriptor("p1", 2, true, ProviderCapabilities::ALL),
            descriptor("p2", 1, true, ProviderCapabilities::ALL),
            descriptor("p3", 3, false, ProviderCapabilities::ALL),
        ])
        .unwrap();

        assert_eq!(ids(&registry.available()), vec!["p2", "p1"]);
    }

    #[test]
    fn test_list_keeps_declaration_order() {
        let registry = ProviderRegistry::new(vec![
            descriptor("p1", 2, true, ProviderCapabilities::ALL),
            descriptor("p2", 1, false, ProviderCapabilities::ALL),
        ])
        .unwrap();
        let listed: Vec<&str> = registry.list().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(listed, vec!["p1", "p2"]);
    }

    #[test]
    fn test_priority_ties_keep_declaration_order() {
        let registry = ProviderRegistry::new(vec![
            descriptor("b", 1, true, ProviderCapabilities::ALL),
            descriptor("a", 1, true, ProviderCapabilities::ALL),
            descriptor("c", 0, true, ProviderCapabilities::ALL),
        ])
        .unwrap();
        assert_eq!(ids(&registry.available()), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_get_unknown_provider() {
        let registry =
            ProviderRegistry::new(vec![descriptor("p1", 1, true, ProviderCapabilities::ALL)])
                .unwrap();
        assert!(registry.get("p1").is_ok());
        assert!(matches!(
            registry.get("nope"),
            Err(OrchestratorError::UnknownProvider(id)) if id == "nope"
        ));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = ProviderRegistry::new(vec![
            descriptor("p1", 1, true, ProviderCapabilities::ALL),
            descriptor("p1", 2, false, ProviderCapabilities::ALL),
        ]);
        assert!(matches!(result, Err(OrchestratorError::InvalidRegistry(_))));
    }

    #[test]
    fn test_available_provider_without_models_rejected() {
        let mut empty = descriptor("p1", 1, true, ProviderCapabilities::ALL);
        empty.models.clear();
        assert!(ProviderRegistry::new(vec![empty.clone()]).is_err());

        empty.available = false;
        assert!(ProviderRegistry::new(vec![empty]).is_ok());
    }

    #[test]
    fn test_from_specs_uses_credential_presence() {
        let creds = StaticCredentials::new()
            .with("GROQ_API_KEY", "gsk-test")
            .with("OPENAI_API_KEY", "sk-test")
            .with("MISTRAL_API_KEY", "");
        let registry = ProviderRegistry::from_specs(&default_catalog(), &creds).unwrap();

        assert_eq!(registry.len(), 5);
        assert_eq!(ids(&registry.available()), vec!["openai", "groq"]);
        assert!(!registry.get("mistral").unwrap().available);
    }

    #[test]
    fn test_from_specs_disabled_provider_unavailable() {
        let mut specs = default_catalog();
        specs[0].enabled = false;
        let creds = StaticCredentials::new().with("ANTHROPIC_API_KEY", "key");
        let registry = ProviderRegistry::from_specs(&specs, &creds).unwrap();
        assert!(!registry.has_available());
    }
}
