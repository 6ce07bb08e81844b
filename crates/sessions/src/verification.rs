use std::{collections::HashMap, sync::RwLock};

use tracing::info;

/// Recipients that completed the verification handshake, with the address
/// their messages are delivered to.
///
/// Written from the inbound path without the session gate: entries are
/// independent per alias.
#[derive(Debug, Default)]
pub struct VerificationRecord {
    addresses: RwLock<HashMap<String, String>>,
}

impl VerificationRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `alias` to `address`, replacing any earlier binding. Returns
    /// `true` on first verification.
    pub fn verify(&self, alias: &str, address: &str) -> bool {
        let mut addresses = self.addresses.write().unwrap_or_else(|e| e.into_inner());
        let first = addresses
            .insert(alias.to_string(), address.to_string())
            .is_none();
        info!(alias, address, first, "recipient verified");
        first
    }

    #[must_use]
    pub fn address(&self, alias: &str) -> Option<String> {
        let addresses = self.addresses.read().unwrap_or_else(|e| e.into_inner());
        addresses.get(alias).cloned()
    }

    /// Addresses of the verified recipients among `aliases`, in order.
    #[must_use]
    pub fn addresses_of(&self, aliases: &[String]) -> Vec<String> {
        let addresses = self.addresses.read().unwrap_or_else(|e| e.into_inner());
        aliases
            .iter()
            .filter_map(|alias| addresses.get(alias).cloned())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.addresses.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
