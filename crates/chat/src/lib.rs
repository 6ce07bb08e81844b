//! Chat core: inbound command routing and per-source summary jobs over a
//! shared, lock-guarded session state.

pub mod error;
pub mod router;
pub mod runtime;
pub mod summary_job;

#[cfg(test)]
mod testing;

pub use {
    error::{Error, GENERIC_FAILURE_REPLY, Result},
    router::{RouteOutcome, Router, VERIFIED_REPLY, VERIFY_COMMAND},
    runtime::{ChatRuntime, SummarySource},
    summary_job::{JobReport, SummaryJob, summary_message},
};
