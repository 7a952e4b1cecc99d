//! Request executor.
//!
//! Issues one generation call through the selected provider in one of three
//! modes (plain text, streaming text, schema-validated structured output),
//! or iterates across all available providers with fallback. GenAI spans
//! instrument every provider call.

use std::future::Future;
use std::time::Duration;

use tracing::{Instrument, info_span};

use devquest_types::config::OrchestratorConfig;
use devquest_types::error::OrchestratorError;
use devquest_types::llm::{CompletionRequest, Message, StopReason, Usage};
use devquest_types::project::ProjectContext;
use devquest_types::provider::{ModelSelection, ProviderDescriptor, TaskType};

use crate::llm::box_provider::BoxLlmProvider;
use crate::llm::clients::ProviderClients;
use crate::llm::fallback::{self, FallbackOutcome, with_timeout};
use crate::llm::registry::ProviderRegistry;
use crate::llm::selector;
use crate::llm::structured::{self, StructuredOutput};
use crate::prompt::{composer, templates};

use super::stream::TextStream;

/// Request limits applied to every call.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorSettings {
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    /// Per-attempt timeout; for streams, the longest wait between chunks.
    pub request_timeout: Option<Duration>,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self::from(&OrchestratorConfig::default())
    }
}

impl From<&OrchestratorConfig> for ExecutorSettings {
    /// A zero `request_timeout_ms` disables the timeout.
    fn from(config: &OrchestratorConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: Some(config.temperature),
            request_timeout: (config.request_timeout_ms > 0)
                .then(|| Duration::from_millis(config.request_timeout_ms)),
        }
    }
}

/// Everything needed to build the prompt for one call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub task: TaskType,
    pub system_prompt: String,
    /// Composed project context; empty means "omit".
    pub context: String,
    /// Prior turns sent ahead of the final prompt.
    pub history: Vec<Message>,
    pub user_message: String,
}

impl GenerationRequest {
    /// Request for `task` using its default system prompt and no context.
    pub fn new(task: TaskType, user_message: impl Into<String>) -> Self {
        Self {
            task,
            system_prompt: templates::system_prompt(task).to_string(),
            context: String::new(),
            history: Vec::new(),
            user_message: user_message.into(),
        }
    }

    pub fn with_context(mut self, context: &ProjectContext) -> Self {
        self.context = composer::compose(context);
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    /// The final prompt sent as the last user message.
    pub fn prompt(&self) -> String {
        composer::assemble_prompt(&self.system_prompt, &self.context, &self.user_message)
    }
}

/// Finished text from one provider.
#[derive(Debug, Clone)]
pub struct Generation {
    pub text: String,
    pub provider_id: String,
    pub model: String,
    pub stop_reason: StopReason,
    pub usage: Usage,
}

/// A schema-validated value plus the raw generation it was parsed from.
#[derive(Debug, Clone)]
pub struct StructuredGeneration<T> {
    pub value: T,
    pub generation: Generation,
}

/// Executes generation calls against the registry's providers.
///
/// Holds the immutable registry and the backend clients; shared read-only
/// across sessions.
pub struct RequestExecutor {
    registry: ProviderRegistry,
    clients: ProviderClients,
    settings: ExecutorSettings,
}

impl RequestExecutor {
    pub fn new(
        registry: ProviderRegistry,
        clients: ProviderClients,
        settings: ExecutorSettings,
    ) -> Self {
        Self {
            registry,
            clients,
            settings,
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn clients(&self) -> &ProviderClients {
        &self.clients
    }

    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    /// Pick provider and model for a task. See [`selector::select`].
    pub fn select(
        &self,
        task: TaskType,
        preferred: Option<&str>,
    ) -> Result<ModelSelection, OrchestratorError> {
        selector::select(&self.registry, task, preferred)
    }

    /// Single round-trip returning finished text.
    pub async fn generate(
        &self,
        selection: &ModelSelection,
        request: &GenerationRequest,
    ) -> Result<Generation, OrchestratorError> {
        let provider_id = selection.provider_id();
        with_timeout(
            provider_id,
            self.settings.request_timeout,
            self.generate_once(provider_id, &selection.model, request),
        )
        .await
    }

    /// Start a streaming call. The returned stream is lazy; nothing is sent
    /// until it is first polled.
    pub fn stream(
        &self,
        selection: &ModelSelection,
        request: &GenerationRequest,
    ) -> Result<TextStream, OrchestratorError> {
        self.open_stream(selection.provider_id(), &selection.model, request)
    }

    /// Single round-trip whose reply must parse and validate as `T`.
    ///
    /// A reply that does not match is `SchemaValidationFailed`, distinct from
    /// a failed provider call.
    pub async fn generate_structured<T: StructuredOutput>(
        &self,
        selection: &ModelSelection,
        request: &GenerationRequest,
    ) -> Result<StructuredGeneration<T>, OrchestratorError> {
        let provider_id = selection.provider_id();
        with_timeout(
            provider_id,
            self.settings.request_timeout,
            self.structured_once::<T>(provider_id, &selection.model, request),
        )
        .await
    }

    /// Run `operation(provider, model)` across available providers in
    /// priority order. See [`fallback::execute_with_fallback`].
    pub async fn execute_with_fallback<T, F, Fut>(
        &self,
        operation: F,
    ) -> Result<FallbackOutcome<T>, OrchestratorError>
    where
        F: FnMut(ProviderDescriptor, String) -> Fut,
        Fut: Future<Output = Result<T, OrchestratorError>>,
    {
        fallback::execute_with_fallback(&self.registry, self.settings.request_timeout, operation)
            .await
    }

    pub async fn generate_with_fallback(
        &self,
        request: &GenerationRequest,
    ) -> Result<FallbackOutcome<Generation>, OrchestratorError> {
        self.execute_with_fallback(|provider, model| async move {
            self.generate_once(&provider.id, &model, request).await
        })
        .await
    }

    pub async fn generate_structured_with_fallback<T: StructuredOutput>(
        &self,
        request: &GenerationRequest,
    ) -> Result<FallbackOutcome<StructuredGeneration<T>>, OrchestratorError> {
        self.execute_with_fallback(|provider, model| async move {
            self.structured_once::<T>(&provider.id, &model, request).await
        })
        .await
    }

    /// Open a stream on the first provider that delivers a first chunk.
    ///
    /// Failures after the first chunk are not retried on another provider.
    pub async fn stream_with_fallback(
        &self,
        request: &GenerationRequest,
    ) -> Result<FallbackOutcome<TextStream>, OrchestratorError> {
        self.execute_with_fallback(|provider, model| async move {
            self.open_stream(&provider.id, &model, request)?
                .prime()
                .await
        })
        .await
    }

    fn client(&self, provider_id: &str) -> Result<&BoxLlmProvider, OrchestratorError> {
        self.clients
            .get(provider_id)
            .ok_or_else(|| OrchestratorError::MissingClient(provider_id.to_string()))
    }

    fn build_request(
        &self,
        model: &str,
        request: &GenerationRequest,
        stream: bool,
    ) -> CompletionRequest {
        let mut messages = request.history.clone();
        messages.push(Message::user(request.prompt()));

        CompletionRequest {
            model: model.to_string(),
            messages,
            system: None,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            stream,
            output_config: None,
        }
    }

    async fn generate_once(
        &self,
        provider_id: &str,
        model: &str,
        request: &GenerationRequest,
    ) -> Result<Generation, OrchestratorError> {
        let completion = self.build_request(model, request, false);
        self.complete(provider_id, request.task, completion).await
    }

    async fn structured_once<T: StructuredOutput>(
        &self,
        provider_id: &str,
        model: &str,
        request: &GenerationRequest,
    ) -> Result<StructuredGeneration<T>, OrchestratorError> {
        let mut completion = self.build_request(model, request, false);
        completion.system = Some(structured::schema_instructions::<T>());
        completion.output_config = Some(structured::output_config::<T>());

        let generation = self.complete(provider_id, request.task, completion).await?;
        match structured::parse_structured::<T>(&generation.text) {
            Ok(value) => Ok(StructuredGeneration { value, generation }),
            Err(err) => {
                tracing::warn!(
                    provider = %provider_id,
                    model = %generation.model,
                    error = %err,
                    "Structured reply failed validation"
                );
                Err(err)
            }
        }
    }

    async fn complete(
        &self,
        provider_id: &str,
        task: TaskType,
        completion: CompletionRequest,
    ) -> Result<Generation, OrchestratorError> {
        let client = self.client(provider_id)?;

        let span = info_span!(
            "gen_ai.complete",
            gen_ai.system = provider_id,
            gen_ai.request.model = %completion.model,
            gen_ai.request.max_tokens = completion.max_tokens,
            gen_ai.request.temperature = ?completion.temperature,
            gen_ai.request.stream = false,
            devquest.task = %task,
        );

        let response = client
            .complete(&completion)
            .instrument(span)
            .await
            .map_err(|err| OrchestratorError::provider(provider_id, err))?;

        tracing::debug!(
            provider = %provider_id,
            model = %response.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            stop_reason = %response.stop_reason,
            "Generation complete"
        );

        Ok(Generation {
            text: response.content,
            provider_id: provider_id.to_string(),
            model: completion.model,
            stop_reason: response.stop_reason,
            usage: response.usage,
        })
    }

    fn open_stream(
        &self,
        provider_id: &str,
        model: &str,
        request: &GenerationRequest,
    ) -> Result<TextStream, OrchestratorError> {
        let client = self.client(provider_id)?;
        let completion = self.build_request(model, request, true);

        let span = info_span!(
            "gen_ai.stream",
            gen_ai.system = provider_id,
            gen_ai.request.model = %completion.model,
            gen_ai.request.max_tokens = completion.max_tokens,
            gen_ai.request.temperature = ?completion.temperature,
            gen_ai.request.stream = true,
            devquest.task = %request.task,
        );

        let events = client.stream(completion);
        Ok(TextStream::from_events(
            provider_id,
            model,
            events,
            self.settings.request_timeout,
            span,
        ))
    }
}
