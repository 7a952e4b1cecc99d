use thiserror::Error;

use crate::llm::LlmError;

/// Errors surfaced by the orchestration layer.
///
/// Selection-time errors (`NoProvidersConfigured`, `UnknownProvider`,
/// `InvalidRegistry`) are fatal and never trigger fallback. Execution-time
/// errors are recoverable inside fallback execution only.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("no AI providers are configured; set at least one provider API key")]
    NoProvidersConfigured,

    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("invalid provider registry: {0}")]
    InvalidRegistry(String),

    #[error("no client is wired for provider '{0}'")]
    MissingClient(String),

    #[error("provider '{provider}' request failed: {source}")]
    ProviderRequestFailed {
        provider: String,
        #[source]
        source: LlmError,
    },

    #[error("response does not match schema '{schema}': {message}")]
    SchemaValidationFailed { schema: String, message: String },

    #[error("all {attempts} providers failed; last error from '{last_provider}': {source}")]
    AllProvidersFailed {
        attempts: usize,
        last_provider: String,
        #[source]
        source: Box<OrchestratorError>,
    },
}

impl OrchestratorError {
    /// Wrap a backend error with the provider that produced it.
    pub fn provider(provider: impl Into<String>, source: LlmError) -> Self {
        OrchestratorError::ProviderRequestFailed {
            provider: provider.into(),
            source,
        }
    }

    /// Selection/configuration errors that must not be retried on another provider.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            OrchestratorError::NoProvidersConfigured
                | OrchestratorError::UnknownProvider(_)
                | OrchestratorError::InvalidRegistry(_)
        )
    }

    /// Execution-time errors that fallback execution may recover from by
    /// moving on to the next provider.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            OrchestratorError::ProviderRequestFailed { .. }
                | OrchestratorError::MissingClient(_)
                | OrchestratorError::SchemaValidationFailed { .. }
        )
    }

    /// The last per-provider error behind an `AllProvidersFailed`, or `self`.
    pub fn last_error(&self) -> &OrchestratorError {
        match self {
            OrchestratorError::AllProvidersFailed { source, .. } => source.last_error(),
            other => other,
        }
    }
}
