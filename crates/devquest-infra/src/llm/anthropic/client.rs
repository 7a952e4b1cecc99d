//! AnthropicProvider: [`LlmProvider`] for the Anthropic Messages API.
//!
//! Sends requests to `/v1/messages` with the API key in `x-api-key`. The key
//! is held as a [`SecretString`] and only exposed when building headers.

use std::pin::Pin;
use std::time::Duration;

use futures_util::Stream;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use secrecy::{ExposeSecret, SecretString};

use devquest_core::llm::provider::LlmProvider;
use devquest_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, MessageRole, StopReason, StreamEvent,
};

use super::streaming::create_anthropic_stream;
use super::types::{
    AnthropicContentBlock, AnthropicError, AnthropicMessage, AnthropicNonStreamResponse,
    AnthropicRequest, ErrorPayload,
};

/// Anthropic Claude provider.
///
/// Does not derive Debug; the API key never reaches formatted output.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    name: String,
    default_model: String,
}

impl AnthropicProvider {
    /// The Anthropic API version header value.
    const API_VERSION: &'static str = "2023-06-01";

    pub const DEFAULT_BASE_URL: &'static str = "https://api.anthropic.com";

    /// Create a provider registered under `name`.
    ///
    /// `default_model` is used when a request leaves `model` empty.
    pub fn new(
        name: impl Into<String>,
        api_key: SecretString,
        default_model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        // No overall timeout: attempts and stream gaps are bounded by the executor.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            name: name.into(),
            default_model: default_model.into(),
        })
    }

    /// Override the base URL (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Convert a generic [`CompletionRequest`] into an [`AnthropicRequest`].
    ///
    /// System-role messages are folded into the top-level `system` field,
    /// after any explicit `request.system`.
    fn to_anthropic_request(&self, request: &CompletionRequest, stream: bool) -> AnthropicRequest {
        let mut system_parts: Vec<&str> = request.system.as_deref().into_iter().collect();
        let mut messages = Vec::with_capacity(request.messages.len());

        for message in &request.messages {
            match message.role {
                MessageRole::System => system_parts.push(&message.content),
                MessageRole::User | MessageRole::Assistant => messages.push(AnthropicMessage {
                    role: message.role.to_string(),
                    content: message.content.clone(),
                }),
            }
        }

        let system = system_parts
            .into_iter()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model.clone()
        };

        AnthropicRequest {
            model,
            max_tokens: request.max_tokens,
            messages,
            system: (!system.is_empty()).then_some(system),
            stream,
            temperature: request.temperature,
            output_config: request.output_config.clone(),
        }
    }

    fn post(&self, body: &AnthropicRequest) -> reqwest::RequestBuilder {
        self.client
            .post(self.url("/v1/messages"))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", Self::API_VERSION)
            .header("content-type", "application/json")
            .json(body)
    }
}

impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.to_anthropic_request(request, false);

        let response = self
            .post(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_ms(response.headers());
            let error_body = response.text().await.unwrap_or_default();
            return Err(map_status(status, &error_body, retry_after));
        }

        let anthropic_resp: AnthropicNonStreamResponse = response.json().await.map_err(|e| {
            LlmError::Deserialization(format!("failed to parse response: {e}"))
        })?;

        let content = anthropic_resp
            .content
            .iter()
            .filter_map(|block| match block {
                AnthropicContentBlock::Text { text } => Some(text.as_str()),
                AnthropicContentBlock::Other => None,
            })
            .collect::<String>();

        let stop_reason = anthropic_resp
            .stop_reason
            .as_deref()
            .map(parse_stop_reason)
            .unwrap_or(StopReason::EndTurn);

        Ok(CompletionResponse {
            id: anthropic_resp.id,
            content,
            model: anthropic_resp.model,
            stop_reason,
            usage: anthropic_resp.usage.into(),
        })
    }

    fn stream(
        &self,
        request: CompletionRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>> {
        let body = self.to_anthropic_request(&request, true);
        create_anthropic_stream(self.post(&body))
    }
}

/// Map an Anthropic `stop_reason` string. `refusal` counts as a content filter.
pub(crate) fn parse_stop_reason(reason: &str) -> StopReason {
    match reason {
        "max_tokens" => StopReason::MaxTokens,
        "stop_sequence" => StopReason::StopSequence,
        "refusal" => StopReason::ContentFilter,
        _ => StopReason::EndTurn,
    }
}

/// Map an in-band Anthropic error object by its `type`.
pub(crate) fn map_api_error(error: AnthropicError) -> LlmError {
    match error.error_type.as_str() {
        "authentication_error" | "permission_error" => LlmError::AuthenticationFailed,
        "rate_limit_error" => LlmError::RateLimited {
            retry_after_ms: None,
        },
        "overloaded_error" => LlmError::Overloaded(error.message),
        "invalid_request_error" | "not_found_error" | "request_too_large" => {
            LlmError::InvalidRequest(error.message)
        }
        _ => LlmError::Provider {
            message: format!("{}: {}", error.error_type, error.message),
        },
    }
}

/// Map a non-2xx HTTP status (and its body) to an [`LlmError`].
pub(crate) fn map_status(status: StatusCode, body: &str, retry_after_ms: Option<u64>) -> LlmError {
    let message = serde_json::from_str::<ErrorPayload>(body)
        .map(|payload| payload.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status.as_u16() {
        401 | 403 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited { retry_after_ms },
        503 | 529 => LlmError::Overloaded(message),
        400 | 404 | 413 => LlmError::InvalidRequest(message),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {message}"),
        },
    }
}

/// `retry-after` header (seconds) converted to milliseconds.
pub(crate) fn retry_after_ms(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| secs.saturating_mul(1000))
}
