//! Name-indexed table of backend clients.
//!
//! The registry only knows descriptors; this table maps each provider id to
//! the `BoxLlmProvider` that actually talks to it.

use std::collections::HashMap;

use super::box_provider::BoxLlmProvider;

/// Backend clients keyed by provider id.
#[derive(Debug, Default)]
pub struct ProviderClients {
    clients: HashMap<String, BoxLlmProvider>,
}

impl ProviderClients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client under the given provider id.
    ///
    /// If a client with this id already exists, it is replaced.
    pub fn register(&mut self, id: impl Into<String>, client: BoxLlmProvider) {
        self.clients.insert(id.into(), client);
    }

    pub fn get(&self, id: &str) -> Option<&BoxLlmProvider> {
        self.clients.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.clients.contains_key(id)
    }

    /// Registered provider ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.clients.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::MockProvider;

    #[test]
    fn test_register_replaces_existing() {
        let mut clients = ProviderClients::new();
        clients.register("openai", BoxLlmProvider::new(MockProvider::replying("first", "a")));
        clients.register("openai", BoxLlmProvider::new(MockProvider::replying("second", "b")));

        assert_eq!(clients.len(), 1);
        assert_eq!(clients.get("openai").map(|c| c.name()), Some("second"));
        assert!(clients.get("groq").is_none());
    }

    #[test]
    fn test_ids_sorted() {
        let mut clients = ProviderClients::new();
        clients.register("groq", BoxLlmProvider::new(MockProvider::replying("groq", "")));
        clients.register("anthropic", BoxLlmProvider::new(MockProvider::replying("anthropic", "")));
        assert_eq!(clients.ids(), vec!["anthropic", "groq"]);
    }
}
