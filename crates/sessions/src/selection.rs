use std::{collections::HashMap, sync::RwLock};

use tracing::debug;

/// Each recipient's active source, used to route freeform chat.
#[derive(Debug, Default)]
pub struct SessionSelection {
    current: RwLock<HashMap<String, String>>,
}

impl SessionSelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `source_id` the active source for `alias`.
    pub fn select(&self, alias: &str, source_id: &str) {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        let previous = current.insert(alias.to_string(), source_id.to_string());
        debug!(alias, source_id, ?previous, "session selected");
    }

    #[must_use]
    pub fn current(&self, alias: &str) -> Option<String> {
        let current = self.current.read().unwrap_or_else(|e| e.into_inner());
        current.get(alias).cloned()
    }
}
