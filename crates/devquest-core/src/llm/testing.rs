//! Shared mock provider and fixtures for unit tests.

use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::Stream;

use devquest_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, StopReason, StreamEvent, Usage,
};
use devquest_types::provider::{ProviderCapabilities, ProviderDescriptor};

use super::provider::LlmProvider;

#[derive(Clone)]
pub(crate) enum MockBehavior {
    Reply(String),
    Chunks(Vec<String>),
    Fail(String),
    Auth,
    Hang,
    /// Stream yields text forever, counting each produced chunk.
    Endless,
}

#[derive(Clone)]
pub(crate) struct MockProvider {
    name: String,
    behavior: MockBehavior,
    pub calls: Arc<AtomicUsize>,
    pub produced: Arc<AtomicUsize>,
    pub last_request: Arc<Mutex<Option<CompletionRequest>>>,
}

impl MockProvider {
    pub fn new(name: &str, behavior: MockBehavior) -> Self {
        Self {
            name: name.to_string(),
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
            produced: Arc::new(AtomicUsize::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    pub fn replying(name: &str, text: &str) -> Self {
        Self::new(name, MockBehavior::Reply(text.to_string()))
    }

    pub fn failing(name: &str, message: &str) -> Self {
        Self::new(name, MockBehavior::Fail(message.to_string()))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }

    fn record(&self, request: &CompletionRequest) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
    }

    fn response(&self, request: &CompletionRequest, content: String) -> CompletionResponse {
        CompletionResponse {
            id: format!("resp-{}", self.name),
            content,
            model: request.model.clone(),
            stop_reason: StopReason::EndTurn,
            usage: Usage {
                input_tokens: 10,
                output_tokens: 20,
            },
        }
    }
}

impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.record(request);
        match &self.behavior {
            MockBehavior::Reply(text) => Ok(self.response(request, text.clone())),
            MockBehavior::Chunks(chunks) => Ok(self.response(request, chunks.concat())),
            MockBehavior::Fail(message) => Err(LlmError::Provider {
                message: message.clone(),
            }),
            MockBehavior::Auth => Err(LlmError::AuthenticationFailed),
            MockBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(LlmError::Provider {
                    message: "unreachable".to_string(),
                })
            }
            MockBehavior::Endless => Ok(self.response(request, String::new())),
        }
    }

    fn stream(
        &self,
        request: CompletionRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>> {
        self.record(&request);
        let behavior = self.behavior.clone();
        let produced = Arc::clone(&self.produced);
        Box::pin(async_stream::stream! {
            yield Ok(StreamEvent::Connected);
            match behavior {
                MockBehavior::Reply(text) => {
                    yield Ok(StreamEvent::TextDelta { text });
                    yield Ok(StreamEvent::Done);
                }
                MockBehavior::Chunks(chunks) => {
                    for text in chunks {
                        yield Ok(StreamEvent::TextDelta { text });
                    }
                    yield Ok(StreamEvent::MessageDelta { stop_reason: StopReason::EndTurn });
                    yield Ok(StreamEvent::Done);
                }
                MockBehavior::Fail(message) => {
                    yield Err(LlmError::Provider { message });
                }
                MockBehavior::Auth => {
                    yield Err(LlmError::AuthenticationFailed);
                }
                MockBehavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                }
                MockBehavior::Endless => {
                    loop {
                        let n = produced.fetch_add(1, Ordering::SeqCst);
                        yield Ok(StreamEvent::TextDelta { text: format!("chunk-{n} ") });
                    }
                }
            }
        })
    }
}

pub(crate) fn descriptor(
    id: &str,
    priority: u32,
    available: bool,
    capabilities: ProviderCapabilities,
) -> ProviderDescriptor {
    ProviderDescriptor {
        id: id.to_string(),
        display_name: id.to_uppercase(),
        models: vec![format!("{id}-large"), format!("{id}-small")],
        available,
        priority,
        capabilities,
    }
}

pub(crate) fn request(model: &str) -> CompletionRequest {
    CompletionRequest {
        model: model.to_string(),
        messages: vec![],
        system: None,
        max_tokens: 100,
        temperature: None,
        stream: false,
        output_config: None,
    }
}
