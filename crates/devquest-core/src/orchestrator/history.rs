//! Append-only conversation log scoped to one session.
//!
//! No size cap: the log lives only as long as its session.

use devquest_types::conversation::ConversationEntry;
use devquest_types::llm::{Message, MessageRole};

#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    entries: Vec<ConversationEntry>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one timestamped entry.
    pub fn append(&mut self, role: MessageRole, content: impl Into<String>) {
        self.entries.push(ConversationEntry::now(role, content));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Copy of the log as of this call.
    pub fn snapshot(&self) -> Vec<ConversationEntry> {
        self.entries.clone()
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    /// User and assistant turns as request messages, oldest first.
    ///
    /// System entries are kept for the record but not replayed.
    pub fn to_messages(&self) -> Vec<Message> {
        self.entries
            .iter()
            .filter(|e| e.role != MessageRole::System)
            .map(ConversationEntry::to_message)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
