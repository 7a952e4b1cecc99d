//! Orchestration configuration types for DevQuest AI.
//!
//! `OrchestratorConfig` represents the top-level `config.toml` controlling
//! request limits, timeouts, the preferred provider, and the provider catalog.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::provider::ProviderCapabilities;

/// Wire protocol a provider speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    Anthropic,
    #[serde(rename = "openai_compatible")]
    OpenAiCompatible,
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderType::Anthropic => write!(f, "anthropic"),
            ProviderType::OpenAiCompatible => write!(f, "openai_compatible"),
        }
    }
}

impl FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" => Ok(ProviderType::Anthropic),
            "openai_compatible" => Ok(ProviderType::OpenAiCompatible),
            other => Err(format!("invalid provider type: '{other}'")),
        }
    }
}

/// Static declaration of one provider, before availability is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpec {
    pub id: String,
    pub display_name: String,
    pub provider_type: ProviderType,
    pub models: Vec<String>,
    pub priority: u32,
    #[serde(default)]
    pub capabilities: ProviderCapabilities,
    /// Credential key whose presence marks the provider available.
    pub credential_key: String,
    /// Override the default base URL for the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Disabled providers are never available.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Top-level configuration for the orchestration layer.
///
/// Loaded from `~/.devquest/config.toml`. All fields have defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Timeout for a single provider attempt (and for the gap between stream chunks).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Provider id tried first when it is available.
    #[serde(default)]
    pub preferred_provider: Option<String>,

    /// Provider catalog in declaration order. Replaces the built-in catalog when set.
    #[serde(default = "default_catalog")]
    pub providers: Vec<ProviderSpec>,
}

fn default_request_timeout_ms() -> u64 {
    60_000
}

fn default_max_tokens() -> u32 {
    4_096
}

fn default_temperature() -> f64 {
    0.7
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            preferred_provider: None,
            providers: default_catalog(),
        }
    }
}

/// Built-in provider catalog, in declaration order.
pub fn default_catalog() -> Vec<ProviderSpec> {
    let spec = |id: &str,
                display_name: &str,
                provider_type: ProviderType,
                models: &[&str],
                priority: u32,
                capabilities: ProviderCapabilities,
                credential_key: &str| ProviderSpec {
        id: id.to_string(),
        display_name: display_name.to_string(),
        provider_type,
        models: models.iter().map(|m| m.to_string()).collect(),
        priority,
        capabilities,
        credential_key: credential_key.to_string(),
        base_url: None,
        enabled: true,
    };

    vec![
        spec(
            "anthropic",
            "Anthropic Claude",
            ProviderType::Anthropic,
            &["claude-sonnet-4-20250514", "claude-3-5-haiku-20241022"],
            1,
            ProviderCapabilities::ALL,
            "ANTHROPIC_API_KEY",
        ),
        spec(
            "openai",
            "OpenAI",
            ProviderType::OpenAiCompatible,
            &["gpt-4o", "gpt-4o-mini"],
            2,
            ProviderCapabilities::ALL,
            "OPENAI_API_KEY",
        ),
        spec(
            "google",
            "Google Gemini",
            ProviderType::OpenAiCompatible,
            &["gemini-2.5-pro", "gemini-2.5-flash"],
            3,
            ProviderCapabilities::ALL,
            "GOOGLE_GENERATIVE_AI_API_KEY",
        ),
        spec(
            "mistral",
            "Mistral AI",
            ProviderType::OpenAiCompatible,
            &["mistral-large-latest"],
            4,
            ProviderCapabilities {
                streaming: true,
                function_calling: true,
                vision: false,
                long_context: true,
            },
            "MISTRAL_API_KEY",
        ),
        spec(
            "groq",
            "Groq",
            ProviderType::OpenAiCompatible,
            &["llama-3.3-70b-versatile"],
            5,
            ProviderCapabilities {
                streaming: true,
                function_calling: true,
                vision: false,
                long_context: false,
            },
            "GROQ_API_KEY",
        ),
    ]
}
