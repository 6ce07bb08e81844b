//! Conversation state shared by the summary jobs and the inbound router.
//!
//! - [`ContextStore`]: conversations per (source, recipient)
//! - [`SessionGate`]: the single exclusive gate around the store
//! - [`SessionSelection`]: each recipient's active source
//! - [`VerificationRecord`]: verified recipients and their addresses
//! - [`ActivityIndicator`]: typing signals while the gate is held

pub mod activity;
pub mod error;
pub mod gate;
pub mod selection;
pub mod store;
pub mod verification;

pub use {
    activity::{ACTIVITY_INTERVAL, ActivityGuard, ActivityIndicator},
    error::{Error, Result},
    gate::{SessionGate, SessionGuard},
    selection::SessionSelection,
    store::ContextStore,
    verification::VerificationRecord,
};
