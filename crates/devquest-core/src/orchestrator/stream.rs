//! Lazy text stream returned by streaming generation.
//!
//! Wraps a provider's event stream: yields only text chunks, enforces an idle
//! timeout between chunks, and keeps the generation span entered while
//! polling. Dropping the stream stops pulling from the provider; chunks
//! already delivered stay delivered.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::{Stream, StreamExt, stream};

use devquest_types::error::OrchestratorError;
use devquest_types::llm::{LlmError, StreamEvent};

type ChunkStream = Pin<Box<dyn Stream<Item = Result<String, OrchestratorError>> + Send + 'static>>;

type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>>;

/// Finite, non-restartable sequence of text chunks from one provider.
pub struct TextStream {
    inner: ChunkStream,
    span: tracing::Span,
    provider_id: String,
    model: String,
}

impl TextStream {
    /// Adapt a provider event stream.
    ///
    /// `idle_timeout` bounds the wait for each next event; expiry ends the
    /// stream with a `Timeout` provider error.
    pub fn from_events(
        provider_id: impl Into<String>,
        model: impl Into<String>,
        events: EventStream,
        idle_timeout: Option<Duration>,
        span: tracing::Span,
    ) -> Self {
        let provider_id = provider_id.into();
        let id = provider_id.clone();

        let inner = async_stream::stream! {
            let mut events = events;
            loop {
                let next = match idle_timeout {
                    Some(limit) => match tokio::time::timeout(limit, events.next()).await {
                        Ok(next) => next,
                        Err(_) => {
                            yield Err(OrchestratorError::provider(
                                &id,
                                LlmError::Timeout { timeout_ms: limit.as_millis() as u64 },
                            ));
                            break;
                        }
                    },
                    None => events.next().await,
                };

                match next {
                    Some(Ok(StreamEvent::TextDelta { text })) => {
                        if !text.is_empty() {
                            yield Ok(text);
                        }
                    }
                    Some(Ok(StreamEvent::Done)) | None => break,
                    Some(Ok(StreamEvent::MessageDelta { stop_reason })) => {
                        tracing::debug!(provider = %id, %stop_reason, "Stream finishing");
                    }
                    Some(Ok(StreamEvent::Usage(usage))) => {
                        tracing::debug!(
                            provider = %id,
                            input_tokens = usage.input_tokens,
                            output_tokens = usage.output_tokens,
                            "Stream usage"
                        );
                    }
                    Some(Ok(StreamEvent::Connected)) => {}
                    Some(Err(err)) => {
                        yield Err(OrchestratorError::provider(&id, err));
                        break;
                    }
                }
            }
        };

        Self {
            inner: Box::pin(inner),
            span,
            provider_id,
            model: model.into(),
        }
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Wait for the first chunk so connection and authentication failures
    /// surface as an error here instead of mid-stream.
    ///
    /// The chunk is kept and yielded first.
    pub async fn prime(mut self) -> Result<Self, OrchestratorError> {
        match self.next().await {
            None => Ok(self),
            Some(Err(err)) => Err(err),
            Some(Ok(chunk)) => {
                let rest = std::mem::replace(&mut self.inner, Box::pin(stream::empty()));
                self.inner = Box::pin(stream::once(async move { Ok(chunk) }).chain(rest));
                Ok(self)
            }
        }
    }
}

impl Stream for TextStream {
    type Item = Result<String, OrchestratorError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let _enter = this.span.enter();
        this.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for TextStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextStream")
            .field("provider_id", &self.provider_id)
            .field("model", &self.model)
            .field("inner", &"<stream>")
            .finish()
    }
}

/// Drain a stream into one string. The first error aborts the collection.
pub async fn collect_text<S>(mut stream: S) -> Result<String, OrchestratorError>
where
    S: Stream<Item = Result<String, OrchestratorError>> + Unpin,
{
    let mut text = String::new();
    while let Some(chunk) = stream.next().await {
        text.push_str(&chunk?);
    }
    Ok(text)
}
