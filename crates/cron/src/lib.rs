//! Fixed-interval job scheduling.
//!
//! Every job runs once as soon as the scheduler starts and then on its own
//! interval. Jobs are independent: each has its own timer task.

pub mod error;
pub mod schedule;
pub mod service;
pub mod types;

pub use {
    error::{Error, Result},
    service::{IntervalScheduler, JobRunFn},
    types::IntervalJob,
};
