//! The process-wide exclusive gate around the context store.
//!
//! Summarization jobs and chat turns both run their whole critical section
//! (upstream round-trips included) under one guard. Waiters queue in FIFO
//! order; the gate is not reentrant.

use std::{
    ops::{Deref, DerefMut},
    time::Instant,
};

use {
    tokio::sync::{Mutex, MutexGuard},
    tracing::debug,
};

use crate::store::ContextStore;

#[derive(Debug, Default)]
pub struct SessionGate {
    store: Mutex<ContextStore>,
}

impl SessionGate {
    #[must_use]
    pub fn new(store: ContextStore) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    /// Wait for exclusive access. `holder` labels the critical section in
    /// logs.
    pub async fn acquire(&self, holder: impl Into<String>) -> SessionGuard<'_> {
        let holder = holder.into();
        let waiting_since = Instant::now();
        let guard = self.store.lock().await;
        debug!(
            holder = %holder,
            waited_ms = waiting_since.elapsed().as_millis() as u64,
            "session gate acquired"
        );
        SessionGuard {
            guard,
            holder,
            acquired_at: Instant::now(),
        }
    }

    /// `true` while some task holds the gate.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.store.try_lock().is_err()
    }
}

/// Exclusive access to the [`ContextStore`]; released on drop, including
/// when the critical section returns early with an error.
pub struct SessionGuard<'a> {
    guard: MutexGuard<'a, ContextStore>,
    holder: String,
    acquired_at: Instant,
}

impl Deref for SessionGuard<'_> {
    type Target = ContextStore;

    fn deref(&self) -> &ContextStore {
        &self.guard
    }
}

impl DerefMut for SessionGuard<'_> {
    fn deref_mut(&mut self) -> &mut ContextStore {
        &mut self.guard
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        debug!(
            holder = %self.holder,
            held_ms = self.acquired_at.elapsed().as_millis() as u64,
            "session gate released"
        );
    }
}
