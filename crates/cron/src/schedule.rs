//! Next-run computation for fixed-interval jobs.

use crate::error::{Error, Result};

/// Next run time (epoch millis) for a job firing every `every_ms` starting
/// at `anchor_ms`.
///
/// Ticks stay aligned to the anchor: a run that overran one or more ticks
/// resumes at the next aligned tick instead of firing back-to-back.
pub fn compute_next_run(job_id: &str, every_ms: u64, anchor_ms: u64, now_ms: u64) -> Result<u64> {
    if every_ms == 0 {
        return Err(Error::invalid_interval(job_id));
    }
    if anchor_ms > now_ms {
        return Ok(anchor_ms);
    }
    let intervals = (now_ms - anchor_ms) / every_ms;
    Ok(anchor_ms.saturating_add((intervals + 1).saturating_mul(every_ms)))
}
