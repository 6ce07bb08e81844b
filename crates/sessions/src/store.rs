//! Conversations keyed by (source, recipient).

use std::collections::HashMap;

use {envoy_agents::Conversation, tracing::debug};

use crate::error::{Error, Result};

/// Owned registry of conversations. Access goes through
/// [`SessionGate`](crate::gate::SessionGate), which serializes readers and
/// writers.
#[derive(Debug, Default)]
pub struct ContextStore {
    contexts: HashMap<String, HashMap<String, Conversation>>,
}

impl ContextStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The conversation for `source_id` and `alias`.
    ///
    /// Absent pairs yield [`Error::NoContextAvailable`]: no summary for that
    /// source has reached that recipient yet.
    pub fn get(&self, source_id: &str, alias: &str) -> Result<&Conversation> {
        self.contexts
            .get(source_id)
            .and_then(|by_alias| by_alias.get(alias))
            .ok_or_else(|| Error::no_context(source_id, alias))
    }

    /// Store or replace a conversation.
    pub fn put(&mut self, source_id: &str, alias: &str, conversation: Conversation) {
        let replaced = self
            .contexts
            .entry(source_id.to_string())
            .or_default()
            .insert(alias.to_string(), conversation)
            .is_some();
        debug!(source_id, alias, replaced, "context stored");
    }

    #[must_use]
    pub fn contains(&self, source_id: &str, alias: &str) -> bool {
        self.get(source_id, alias).is_ok()
    }

    /// Total number of stored conversations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.values().map(HashMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_pair_is_no_context() {
        let store = ContextStore::new();
        let err = store.get("news", "alice").unwrap_err();
        assert!(matches!(
            err,
            Error::NoContextAvailable { ref source_id, ref alias }
                if source_id == "news" && alias == "alice"
        ));
    }

    #[test]
    fn put_then_get() {
        let mut store = ContextStore::new();
        store.put("news", "alice", Conversation::new("sys"));
        assert!(store.contains("news", "alice"));
        assert!(!store.contains("news", "bob"));
        assert!(!store.contains("sports", "alice"));
        assert_eq!(store.get("news", "alice").unwrap().messages().len(), 1);
    }

    #[test]
    fn put_replaces_existing() {
        let mut store = ContextStore::new();
        store.put("news", "alice", Conversation::new("first"));
        store.put("news", "alice", Conversation::new("second"));
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get("news", "alice").unwrap().messages()[0].content(),
            "second"
        );
    }
}
