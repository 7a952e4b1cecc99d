//! Anthropic SSE stream to [`StreamEvent`] adapter.
//!
//! The Messages API emits named events (`message_start`,
//! `content_block_delta`, `message_delta`, `message_stop`, `ping`, `error`).
//! Each `data:` payload is decoded according to its event name.

use std::pin::Pin;

use futures_util::{Stream, StreamExt};
use reqwest_eventsource::{Event, EventSource};

use devquest_types::llm::{LlmError, StreamEvent, Usage};

use super::client::{map_api_error, map_status, parse_stop_reason, retry_after_ms};
use super::types::{
    AnthropicDelta, ContentBlockDeltaPayload, ErrorPayload, MessageDeltaPayload,
    MessageStartPayload,
};

/// Open an SSE stream for a prepared Messages API request.
///
/// Emits `Connected` once the response headers arrive, then text deltas,
/// the stop reason, usage, and finally `Done` on `message_stop`. Any error
/// closes the source so it is never retried by the event-source layer.
pub fn create_anthropic_stream(
    request: reqwest::RequestBuilder,
) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>> {
    Box::pin(async_stream::try_stream! {
        let mut source = EventSource::new(request)
            .map_err(|e| LlmError::Stream(format!("request cannot be streamed: {e}")))?;

        while let Some(event) = source.next().await {
            match event {
                Ok(Event::Open) => yield StreamEvent::Connected,
                Ok(Event::Message(message)) => {
                    let parsed = parse_sse_event(&message.event, &message.data);
                    if parsed.is_err() {
                        source.close();
                    }

                    let mut finished = false;
                    for ev in parsed? {
                        finished |= matches!(ev, StreamEvent::Done);
                        yield ev;
                    }
                    if finished {
                        source.close();
                        break;
                    }
                }
                Err(reqwest_eventsource::Error::StreamEnded) => break,
                Err(err) => {
                    source.close();
                    let mapped = map_eventsource_error(err).await;
                    Err::<(), LlmError>(mapped)?;
                }
            }
        }
    })
}

/// Decode one SSE message into zero or more [`StreamEvent`]s.
pub fn parse_sse_event(event: &str, data: &str) -> Result<Vec<StreamEvent>, LlmError> {
    match event {
        "message_start" => {
            let payload: MessageStartPayload = decode(event, data)?;
            Ok(payload
                .message
                .usage
                .map(|u| StreamEvent::Usage(Usage::from(u)))
                .into_iter()
                .collect())
        }
        "content_block_delta" => {
            let payload: ContentBlockDeltaPayload = decode(event, data)?;
            match payload.delta {
                AnthropicDelta::TextDelta { text } if !text.is_empty() => {
                    Ok(vec![StreamEvent::TextDelta { text }])
                }
                _ => Ok(Vec::new()),
            }
        }
        "message_delta" => {
            let payload: MessageDeltaPayload = decode(event, data)?;
            let mut events = Vec::with_capacity(2);
            if let Some(reason) = payload.delta.stop_reason.as_deref() {
                events.push(StreamEvent::MessageDelta {
                    stop_reason: parse_stop_reason(reason),
                });
            }
            if let Some(usage) = payload.usage {
                events.push(StreamEvent::Usage(Usage::from(usage)));
            }
            Ok(events)
        }
        "message_stop" => Ok(vec![StreamEvent::Done]),
        "error" => {
            let payload: ErrorPayload = decode(event, data)?;
            Err(map_api_error(payload.error))
        }
        "ping" | "content_block_start" | "content_block_stop" => Ok(Vec::new()),
        other => {
            tracing::debug!(event = other, "Ignoring unknown Anthropic SSE event");
            Ok(Vec::new())
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(event: &str, data: &str) -> Result<T, LlmError> {
    serde_json::from_str(data)
        .map_err(|e| LlmError::Deserialization(format!("invalid {event} payload: {e}")))
}

async fn map_eventsource_error(err: reqwest_eventsource::Error) -> LlmError {
    use reqwest_eventsource::Error;

    match err {
        Error::InvalidStatusCode(status, response) => {
            let retry_after = retry_after_ms(response.headers());
            let body = response.text().await.unwrap_or_default();
            map_status(status, &body, retry_after)
        }
        Error::Transport(e) => LlmError::Provider {
            message: format!("HTTP request failed: {e}"),
        },
        other => LlmError::Stream(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devquest_types::llm::StopReason;

    #[test]
    fn test_text_delta_event() {
        let events = parse_sse_event(
            "content_block_delta",
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Level 1"}}"#,
        )
        .unwrap();
        assert!(matches!(&events[..], [StreamEvent::TextDelta { text }] if text == "Level 1"));
    }

    #[test]
    fn test_non_text_delta_is_skipped() {
        let events = parse_sse_event(
            "content_block_delta",
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"input_json_delta","partial_json":"{"}}"#,
        )
        .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_message_delta_yields_stop_reason_and_usage() {
        let events = parse_sse_event(
            "message_delta",
            r#"{"type":"message_delta","delta":{"stop_reason":"max_tokens"},"usage":{"output_tokens":42}}"#,
        )
        .unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            StreamEvent::MessageDelta { stop_reason: StopReason::MaxTokens }
        ));
        assert!(matches!(events[1], StreamEvent::Usage(u) if u.output_tokens == 42));
    }

    #[test]
    fn test_message_stop_is_done() {
        let events = parse_sse_event("message_stop", r#"{"type":"message_stop"}"#).unwrap();
        assert!(matches!(&events[..], [StreamEvent::Done]));
    }

    #[test]
    fn test_error_event_maps_to_llm_error() {
        let err = parse_sse_event(
            "error",
            r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, LlmError::Overloaded(msg) if msg == "Overloaded"));
    }

    #[test]
    fn test_ping_and_unknown_events_ignored() {
        assert!(parse_sse_event("ping", "{}").unwrap().is_empty());
        assert!(parse_sse_event("mystery", "{}").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_payload_is_deserialization_error() {
        let err = parse_sse_event("content_block_delta", "not json").unwrap_err();
        assert!(matches!(err, LlmError::Deserialization(_)));
    }
}
