//! LLM provider backends.
//!
//! Concrete implementations of the [`LlmProvider`] trait defined in
//! `devquest-core`, a factory ([`create_provider`]) that builds the right
//! backend from a [`ProviderSpec`], and [`build_clients`] which wires one
//! client per available provider.
//!
//! [`LlmProvider`]: devquest_core::llm::provider::LlmProvider

pub mod anthropic;
pub mod openai_compat;

#[cfg(test)]
pub(crate) mod test_support;

use secrecy::SecretString;

use devquest_core::llm::box_provider::BoxLlmProvider;
use devquest_core::llm::clients::ProviderClients;
use devquest_core::llm::credentials::CredentialSource;
use devquest_core::llm::registry::ProviderRegistry;
use devquest_types::config::{ProviderSpec, ProviderType};
use devquest_types::llm::{CompletionRequest, LlmError, Message};

use self::anthropic::AnthropicProvider;
use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config::{OpenAiCompatConfig, default_base_url};

/// Create a [`BoxLlmProvider`] for `spec` using the resolved `api_key`.
///
/// The client is registered under `spec.id`; its default model is the
/// first declared model.
///
/// # Errors
///
/// `InvalidRequest` when an OpenAI-compatible provider has no `base_url`
/// and its id is not a well-known provider.
pub fn create_provider(spec: &ProviderSpec, api_key: &str) -> Result<BoxLlmProvider, LlmError> {
    let default_model = spec.models.first().cloned().unwrap_or_default();

    match spec.provider_type {
        ProviderType::Anthropic => {
            let secret = SecretString::from(api_key.to_string());
            let mut provider = AnthropicProvider::new(spec.id.clone(), secret, default_model)?;
            if let Some(base_url) = spec.base_url.as_deref() {
                provider = provider.with_base_url(base_url);
            }
            Ok(BoxLlmProvider::new(provider))
        }
        ProviderType::OpenAiCompatible => {
            let base_url = spec
                .base_url
                .as_deref()
                .or_else(|| default_base_url(&spec.id))
                .ok_or_else(|| {
                    LlmError::InvalidRequest(format!(
                        "provider '{}' needs a base_url (no built-in endpoint for that id)",
                        spec.id
                    ))
                })?;

            let provider = OpenAiCompatibleProvider::new(OpenAiCompatConfig {
                provider_name: spec.id.clone(),
                base_url: base_url.to_string(),
                api_key: api_key.to_string(),
                default_model,
            });
            Ok(BoxLlmProvider::new(provider))
        }
    }
}

/// Build one client per available provider in `registry`.
///
/// Specs are matched to descriptors by id. A provider whose client cannot
/// be built is logged and left out; executing against it later fails with
/// a missing-client error, which the fallback chain skips past.
pub fn build_clients(
    registry: &ProviderRegistry,
    specs: &[ProviderSpec],
    credentials: &dyn CredentialSource,
) -> ProviderClients {
    let mut clients = ProviderClients::new();

    for descriptor in registry.available() {
        let Some(spec) = specs.iter().find(|s| s.id == descriptor.id) else {
            tracing::warn!(provider = %descriptor.id, "No spec for available provider, skipping");
            continue;
        };
        let Some(api_key) = credentials.get(&spec.credential_key) else {
            tracing::warn!(
                provider = %spec.id,
                credential = %spec.credential_key,
                "Credential disappeared after registry build, skipping"
            );
            continue;
        };

        match create_provider(spec, api_key.trim()) {
            Ok(client) => {
                tracing::debug!(provider = %spec.id, kind = %spec.provider_type, "Provider client ready");
                clients.register(spec.id.clone(), client);
            }
            Err(e) => {
                tracing::warn!(provider = %spec.id, error = %e, "Failed to create provider client");
            }
        }
    }

    clients
}

/// Verify a provider answers by sending a tiny completion request.
pub async fn test_provider_connection(provider: &BoxLlmProvider, model: &str) -> Result<(), LlmError> {
    let request = CompletionRequest {
        model: model.to_string(),
        messages: vec![Message::user("Hello")],
        system: None,
        max_tokens: 10,
        temperature: Some(0.0),
        stream: false,
        output_config: None,
    };
    provider.complete(&request).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use devquest_core::llm::credentials::StaticCredentials;
    use devquest_types::config::default_catalog;
    use devquest_types::provider::ProviderCapabilities;

    fn custom_spec(base_url: Option<&str>) -> ProviderSpec {
        ProviderSpec {
            id: "local".to_string(),
            display_name: "Local vLLM".to_string(),
            provider_type: ProviderType::OpenAiCompatible,
            models: vec!["qwen2.5-coder".to_string()],
            priority: 9,
            capabilities: ProviderCapabilities::NONE,
            credential_key: "LOCAL_LLM_KEY".to_string(),
            base_url: base_url.map(str::to_string),
            enabled: true,
        }
    }

    #[test]
    fn test_create_provider_for_every_catalog_entry() {
        for spec in default_catalog() {
            let provider = create_provider(&spec, "sk-test").unwrap();
            assert_eq!(provider.name(), spec.id);
        }
    }

    #[test]
    fn test_create_provider_custom_needs_base_url() {
        assert!(matches!(
            create_provider(&custom_spec(None), "key"),
            Err(LlmError::InvalidRequest(_))
        ));
        let provider = create_provider(&custom_spec(Some("http://localhost:8000/v1")), "key").unwrap();
        assert_eq!(provider.name(), "local");
    }

    #[test]
    fn test_build_clients_only_for_available() {
        let specs = default_catalog();
        let creds = StaticCredentials::new()
            .with("ANTHROPIC_API_KEY", "sk-ant")
            .with("GROQ_API_KEY", "gsk");
        let registry = ProviderRegistry::from_specs(&specs, &creds).unwrap();

        let clients = build_clients(&registry, &specs, &creds);
        assert_eq!(clients.ids(), vec!["anthropic", "groq"]);
    }

    #[test]
    fn test_build_clients_skips_unbuildable() {
        let specs = vec![custom_spec(None)];
        let creds = StaticCredentials::new().with("LOCAL_LLM_KEY", "k");
        let registry = ProviderRegistry::from_specs(&specs, &creds).unwrap();

        let clients = build_clients(&registry, &specs, &creds);
        assert!(registry.has_available());
        assert!(clients.is_empty());
    }
}
