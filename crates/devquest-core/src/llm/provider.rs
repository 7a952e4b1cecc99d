//! LlmProvider trait definition.
//!
//! This is the single capability interface every backend implements, so the
//! selector and executor never branch on provider identity. Uses RPITIT for
//! `complete` and `Pin<Box<dyn Stream>>` for `stream` (streams need to be
//! object-safe for the `BoxLlmProvider` wrapper).

use std::pin::Pin;

use futures_util::Stream;

use devquest_types::llm::{CompletionRequest, CompletionResponse, LlmError, StreamEvent};

/// Trait for LLM provider backends (Anthropic, OpenAI-compatible, ...).
///
/// Implementations live in devquest-infra. Structured output is not a
/// separate method: callers set `CompletionRequest::output_config` and parse
/// the completed text.
pub trait LlmProvider: Send + Sync {
    /// Provider id this client serves (e.g., "anthropic", "groq").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;

    /// Send a streaming completion request. Returns a stream of events.
    ///
    /// The stream is lazy: no network work happens until it is first polled,
    /// and dropping it stops further reads.
    fn stream(
        &self,
        request: CompletionRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>>;
}
