//! Connection settings for OpenAI-compatible providers.
//!
//! Every provider that speaks the chat completions protocol shares one
//! client; only the base URL and key differ.

/// Settings used to construct an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Provider id the client is registered under (e.g., "openai", "groq").
    pub provider_name: String,
    /// API root, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub api_key: String,
    /// Model used when a request leaves `model` empty.
    pub default_model: String,
}

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const GOOGLE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const MISTRAL_BASE_URL: &str = "https://api.mistral.ai/v1";
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Built-in base URL for a well-known provider id.
pub fn default_base_url(provider_id: &str) -> Option<&'static str> {
    match provider_id {
        "openai" => Some(OPENAI_BASE_URL),
        "google" | "gemini" => Some(GOOGLE_BASE_URL),
        "mistral" => Some(MISTRAL_BASE_URL),
        "groq" => Some(GROQ_BASE_URL),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_base_urls() {
        assert_eq!(default_base_url("openai"), Some(OPENAI_BASE_URL));
        assert_eq!(default_base_url("google"), Some(GOOGLE_BASE_URL));
        assert_eq!(default_base_url("groq"), Some(GROQ_BASE_URL));
        assert_eq!(default_base_url("local-vllm"), None);
    }
}
