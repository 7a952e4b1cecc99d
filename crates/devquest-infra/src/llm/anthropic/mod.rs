//! Anthropic Claude backend.
//!
//! [`AnthropicProvider`] implements
//! [`LlmProvider`](devquest_core::llm::provider::LlmProvider) for the
//! Anthropic Messages API, including SSE streaming.

pub mod client;
pub mod streaming;
pub mod types;

pub use client::AnthropicProvider;
