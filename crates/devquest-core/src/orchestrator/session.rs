//! Orchestrator session: one task, one project context, one conversation.
//!
//! A session is created per logical unit of work (a chat, a brainstorm) and
//! dropped when it ends. It owns its context and history exclusively; the
//! executor (registry + clients) is the only shared state and is read-only.

use std::sync::Arc;

use uuid::Uuid;

use devquest_types::conversation::ConversationEntry;
use devquest_types::error::OrchestratorError;
use devquest_types::llm::MessageRole;
use devquest_types::project::ProjectContext;
use devquest_types::provider::{ModelSelection, TaskType};

use crate::llm::fallback::FallbackOutcome;
use crate::llm::structured::StructuredOutput;
use crate::prompt::templates;

use super::executor::{Generation, GenerationRequest, RequestExecutor};
use super::history::ConversationHistory;
use super::stream::TextStream;

const INTERRUPTED_MARKER: &str = "[reply interrupted]";

pub struct OrchestratorSession {
    id: Uuid,
    executor: Arc<RequestExecutor>,
    task: TaskType,
    preferred_provider: Option<String>,
    system_prompt: Option<String>,
    project_id: Option<String>,
    context: ProjectContext,
    history: ConversationHistory,
}

impl OrchestratorSession {
    pub fn new(executor: Arc<RequestExecutor>, task: TaskType) -> Self {
        let id = Uuid::now_v7();
        tracing::debug!(session_id = %id, task = %task, "Session started");
        Self {
            id,
            executor,
            task,
            preferred_provider: None,
            system_prompt: None,
            project_id: None,
            context: ProjectContext::default(),
            history: ConversationHistory::new(),
        }
    }

    /// Prefer this provider whenever it is available.
    pub fn with_preferred_provider(mut self, provider_id: impl Into<String>) -> Self {
        self.preferred_provider = Some(provider_id.into());
        self
    }

    /// Override the task's default system prompt.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn task(&self) -> TaskType {
        self.task
    }

    pub fn preferred_provider(&self) -> Option<&str> {
        self.preferred_provider.as_deref()
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub fn context(&self) -> &ProjectContext {
        &self.context
    }

    /// Patch the active project's context between requests.
    pub fn context_mut(&mut self) -> &mut ProjectContext {
        &mut self.context
    }

    /// Make `project_id` the active project with `context`.
    ///
    /// Switching to a different project clears the conversation so earlier
    /// turns never leak into the new project's prompts.
    pub fn set_current_project(&mut self, project_id: impl Into<String>, context: ProjectContext) {
        let project_id = project_id.into();
        if self.project_id.as_deref() != Some(project_id.as_str()) {
            tracing::debug!(
                session_id = %self.id,
                project = %project_id,
                cleared = self.history.len(),
                "Active project changed, clearing history"
            );
            self.history.clear();
        }
        self.project_id = Some(project_id);
        self.context = context;
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Conversation as of this call.
    pub fn snapshot(&self) -> Vec<ConversationEntry> {
        self.history.snapshot()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Provider and model the next single-provider request would use.
    pub fn select(&self) -> Result<ModelSelection, OrchestratorError> {
        self.executor
            .select(self.task, self.preferred_provider.as_deref())
    }

    /// Plain generation on the selected provider.
    pub async fn ask(&mut self, user_message: &str) -> Result<Generation, OrchestratorError> {
        let selection = self.select()?;
        let request = self.request(user_message);
        let generation = self.executor.generate(&selection, &request).await?;
        self.record_turn(user_message, &generation.text);
        Ok(generation)
    }

    /// Streaming generation on the selected provider.
    ///
    /// The user turn is recorded now; call [`record_reply`](Self::record_reply)
    /// with the collected text once the stream has been consumed.
    pub fn ask_stream(&mut self, user_message: &str) -> Result<TextStream, OrchestratorError> {
        let selection = self.select()?;
        let request = self.request(user_message);
        let stream = self.executor.stream(&selection, &request)?;
        self.history.append(MessageRole::User, user_message);
        Ok(stream)
    }

    /// Record an assistant reply produced outside `ask` (e.g., a consumed stream).
    pub fn record_reply(&mut self, reply: impl Into<String>) {
        self.history.append(MessageRole::Assistant, reply);
    }

    /// Record the text a stream produced before it failed, so the user turn
    /// still has an assistant reply after it.
    pub fn record_interrupted_reply(&mut self, partial: &str) {
        let partial = partial.trim_end();
        let reply = if partial.is_empty() {
            INTERRUPTED_MARKER.to_string()
        } else {
            format!("{partial} {INTERRUPTED_MARKER}")
        };
        self.history.append(MessageRole::Assistant, reply);
    }

    /// Structured generation on the selected provider.
    pub async fn ask_structured<T: StructuredOutput>(
        &mut self,
        user_message: &str,
    ) -> Result<T, OrchestratorError> {
        let selection = self.select()?;
        let request = self.request(user_message);
        let result = self
            .executor
            .generate_structured::<T>(&selection, &request)
            .await?;
        self.record_turn(user_message, &result.generation.text);
        Ok(result.value)
    }

    /// Plain generation across all available providers in priority order.
    ///
    /// The session's preferred provider does not apply here.
    pub async fn ask_with_fallback(
        &mut self,
        user_message: &str,
    ) -> Result<FallbackOutcome<Generation>, OrchestratorError> {
        let request = self.request(user_message);
        let outcome = self.executor.generate_with_fallback(&request).await?;
        self.record_turn(user_message, &outcome.value.text);
        Ok(outcome)
    }

    /// Structured generation across all available providers.
    ///
    /// A reply that fails validation moves on to the next provider.
    pub async fn ask_structured_with_fallback<T: StructuredOutput>(
        &mut self,
        user_message: &str,
    ) -> Result<FallbackOutcome<T>, OrchestratorError> {
        let request = self.request(user_message);
        let outcome = self
            .executor
            .generate_structured_with_fallback::<T>(&request)
            .await?;
        self.record_turn(user_message, &outcome.value.generation.text);
        Ok(FallbackOutcome {
            value: outcome.value.value,
            provider_id: outcome.provider_id,
            model: outcome.model,
            attempts: outcome.attempts,
            failover_warning: outcome.failover_warning,
        })
    }

    /// Streaming generation on the first provider that yields a first chunk.
    ///
    /// The user turn is recorded once a stream is open; the reply goes through
    /// [`record_reply`](Self::record_reply) as with [`ask_stream`](Self::ask_stream).
    pub async fn ask_stream_with_fallback(
        &mut self,
        user_message: &str,
    ) -> Result<FallbackOutcome<TextStream>, OrchestratorError> {
        let request = self.request(user_message);
        let outcome = self.executor.stream_with_fallback(&request).await?;
        self.history.append(MessageRole::User, user_message);
        Ok(outcome)
    }

    fn request(&self, user_message: &str) -> GenerationRequest {
        let system_prompt = self
            .system_prompt
            .clone()
            .unwrap_or_else(|| templates::system_prompt(self.task).to_string());
        GenerationRequest::new(self.task, user_message)
            .with_system_prompt(system_prompt)
            .with_context(&self.context)
            .with_history(self.history.to_messages())
    }

    fn record_turn(&mut self, user_message: &str, reply: &str) {
        self.history.append(MessageRole::User, user_message);
        self.history.append(MessageRole::Assistant, reply);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::box_provider::BoxLlmProvider;
    use crate::llm::clients::ProviderClients;
    use crate::llm::provider::LlmProvider;
    use crate::llm::registry::ProviderRegistry;
    use crate::llm::testing::{MockBehavior, MockProvider, descriptor};
    use crate::orchestrator::executor::ExecutorSettings;
    use crate::orchestrator::stream::collect_text;
    use devquest_types::project::{GameDesignDoc, GddField, ScopeReport};
    use devquest_types::provider::ProviderCapabilities;

    fn shared_executor(providers: Vec<(MockProvider, ProviderCapabilities)>) -> Arc<RequestExecutor> {
        let registry = ProviderRegistry::new(
            providers
                .iter()
                .enumerate()
                .map(|(i, (p, caps))| descriptor(p.name(), i as u32 + 1, true, *caps))
                .collect(),
        )
        .unwrap();
        let mut clients = ProviderClients::new();
        for (provider, _) in providers {
            clients.register(provider.name().to_string(), BoxLlmProvider::new(provider));
        }
        Arc::new(RequestExecutor::new(
            registry,
            clients,
            ExecutorSettings::default(),
        ))
    }

    fn project(name: &str) -> ProjectContext {
        ProjectContext::new(GameDesignDoc {
            name: Some(name.to_string()),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_ask_records_both_turns() {
        let provider = MockProvider::replying("alpha", "Try a tower defense");
        let executor = shared_executor(vec![(provider.clone(), ProviderCapabilities::ALL)]);
        let mut session = OrchestratorSession::new(executor, TaskType::Oracle);

        session.ask("Ideas?").await.unwrap();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].role, MessageRole::User);
        assert_eq!(snapshot[0].content, "Ideas?");
        assert_eq!(snapshot[1].content, "Try a tower defense");

        session.ask("More?").await.unwrap();
        let sent = provider.last_request().unwrap();
        assert_eq!(sent.messages.len(), 3);
        assert_eq!(sent.messages[0].content, "Ideas?");
    }

    #[tokio::test]
    async fn test_failed_ask_records_nothing() {
        let executor = shared_executor(vec![(
            MockProvider::failing("alpha", "boom"),
            ProviderCapabilities::ALL,
        )]);
        let mut session = OrchestratorSession::new(executor, TaskType::Chat);
        assert!(session.ask("hi").await.is_err());
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let executor = shared_executor(vec![(
            MockProvider::replying("alpha", "ok"),
            ProviderCapabilities::ALL,
        )]);
        let mut s1 = OrchestratorSession::new(Arc::clone(&executor), TaskType::Chat);
        let s2 = OrchestratorSession::new(executor, TaskType::Chat);

        s1.ask("only for s1").await.unwrap();
        assert_eq!(s1.snapshot().len(), 2);
        assert!(s2.snapshot().is_empty());
        assert_ne!(s1.id(), s2.id());
    }

    #[tokio::test]
    async fn test_project_switch_clears_history() {
        let executor = shared_executor(vec![(
            MockProvider::replying("alpha", "ok"),
            ProviderCapabilities::ALL,
        )]);
        let mut session = OrchestratorSession::new(executor, TaskType::Chat);
        session.set_current_project("p1", project("One"));
        session.ask("hello").await.unwrap();

        session.set_current_project("p1", project("One, renamed"));
        assert_eq!(session.history().len(), 2);

        session.set_current_project("p2", project("Two"));
        assert!(session.history().is_empty());
        assert_eq!(session.project_id(), Some("p2"));
        assert_eq!(session.context().gdd.get(GddField::Name), Some("Two"));
    }

    #[tokio::test]
    async fn test_context_patches_reach_prompt() {
        let provider = MockProvider::replying("alpha", "ok");
        let executor = shared_executor(vec![(provider.clone(), ProviderCapabilities::ALL)]);
        let mut session =
            OrchestratorSession::new(executor, TaskType::Assets).with_system_prompt("SYS");
        session
            .context_mut()
            .set_field(GddField::Genre, Some("Metroidvania".to_string()));

        session.ask("List assets").await.unwrap();
        let prompt = provider.last_request().unwrap().messages.last().unwrap().content.clone();
        assert_eq!(
            prompt,
            "SYS\n\n## Project Context (GDD)\n- Genre: Metroidvania\n\nUser Request:\nList assets"
        );
    }

    #[tokio::test]
    async fn test_preferred_provider_used() {
        let a = MockProvider::replying("a", "from a");
        let b = MockProvider::replying("b", "from b");
        let executor = shared_executor(vec![
            (a, ProviderCapabilities::ALL),
            (b, ProviderCapabilities::NONE),
        ]);
        let mut session =
            OrchestratorSession::new(executor, TaskType::Chat).with_preferred_provider("b");

        assert_eq!(session.preferred_provider(), Some("b"));
        let generation = session.ask("hi").await.unwrap();
        assert_eq!(generation.provider_id, "b");
    }

    #[tokio::test]
    async fn test_ask_stream_then_record_reply() {
        let executor = shared_executor(vec![(
            MockProvider::new("alpha", MockBehavior::Chunks(vec!["Pix".into(), "el".into()])),
            ProviderCapabilities::ALL,
        )]);
        let mut session = OrchestratorSession::new(executor, TaskType::Chat);

        let stream = session.ask_stream("Style?").unwrap();
        assert_eq!(session.history().len(), 1);
        let reply = collect_text(stream).await.unwrap();
        session.record_reply(reply);

        let snapshot = session.snapshot();
        assert_eq!(snapshot[1].role, MessageRole::Assistant);
        assert_eq!(snapshot[1].content, "Pixel");
    }

    #[tokio::test]
    async fn test_failed_stream_keeps_turns_alternating() {
        let executor = shared_executor(vec![(
            MockProvider::failing("alpha", "connection reset"),
            ProviderCapabilities::ALL,
        )]);
        let mut session = OrchestratorSession::new(executor, TaskType::Chat);

        let stream = session.ask_stream("Boss ideas?").unwrap();
        assert!(collect_text(stream).await.is_err());
        session.record_interrupted_reply("");
        session.record_interrupted_reply("A giant moth ");

        let snapshot = session.snapshot();
        assert_eq!(snapshot[0].role, MessageRole::User);
        assert_eq!(snapshot[1].role, MessageRole::Assistant);
        assert_eq!(snapshot[1].content, "[reply interrupted]");
        assert_eq!(snapshot[2].content, "A giant moth [reply interrupted]");
    }

    #[tokio::test]
    async fn test_ask_structured_schema_failure() {
        let executor = shared_executor(vec![(
            MockProvider::replying("alpha", "{\"score\": \"high\"}"),
            ProviderCapabilities::ALL,
        )]);
        let mut session = OrchestratorSession::new(executor, TaskType::Scope);
        let err = session.ask_structured::<ScopeReport>("assess").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::SchemaValidationFailed { .. }));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_ask_with_fallback_records_reply() {
        let executor = shared_executor(vec![
            (MockProvider::failing("a", "down"), ProviderCapabilities::ALL),
            (MockProvider::replying("b", "rescued"), ProviderCapabilities::ALL),
        ]);
        let mut session = OrchestratorSession::new(executor, TaskType::Chat);
        let outcome = session.ask_with_fallback("help").await.unwrap();

        assert_eq!(outcome.provider_id, "b");
        assert_eq!(session.snapshot()[1].content, "rescued");
    }

    #[tokio::test]
    async fn test_ask_structured_with_fallback_skips_bad_schema() {
        let executor = shared_executor(vec![
            (MockProvider::replying("a", "not json at all"), ProviderCapabilities::ALL),
            (
                MockProvider::replying(
                    "b",
                    r#"{"score": 64, "riskLevel": "yellow", "criticalPath": ["netcode"]}"#,
                ),
                ProviderCapabilities::ALL,
            ),
        ]);
        let mut session = OrchestratorSession::new(executor, TaskType::Scope);
        let outcome = session
            .ask_structured_with_fallback::<ScopeReport>("assess")
            .await
            .unwrap();

        assert_eq!(outcome.provider_id, "b");
        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.value.score, 64);
        assert!(outcome.failover_warning.is_some());
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn test_ask_stream_with_fallback_records_user_turn() {
        let executor = shared_executor(vec![
            (MockProvider::new("a", MockBehavior::Auth), ProviderCapabilities::ALL),
            (
                MockProvider::new("b", MockBehavior::Chunks(vec!["Ro".into(), "gue".into()])),
                ProviderCapabilities::ALL,
            ),
        ]);
        let mut session = OrchestratorSession::new(executor, TaskType::Oracle);
        let outcome = session.ask_stream_with_fallback("Genre?").await.unwrap();
        assert_eq!(outcome.provider_id, "b");
        assert_eq!(session.history().len(), 1);

        let reply = collect_text(outcome.value).await.unwrap();
        session.record_reply(reply);
        assert_eq!(session.snapshot()[1].content, "Rogue");
    }
}
