use std::time::Duration;

/// A job firing at a fixed interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalJob {
    pub id: String,
    pub every: Duration,
}
