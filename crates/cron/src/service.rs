//! Interval scheduler: one task per job, first run immediately.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use {
    futures::future::join_all,
    tokio::{
        sync::{Mutex, RwLock},
        task::JoinHandle,
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use crate::{
    error::{Error, Result},
    schedule::compute_next_run,
    types::IntervalJob,
};

/// Callback invoked with the job id on every firing. The scheduler awaits
/// it, so a job never overlaps itself.
pub type JobRunFn = Arc<dyn Fn(String) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Runs each job immediately and then every `job.every`, independently of
/// the other jobs.
pub struct IntervalScheduler {
    jobs: RwLock<Vec<IntervalJob>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    cancel: CancellationToken,
    on_run: JobRunFn,
}

fn now_ms() -> u64 {
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    to_ms(since_epoch)
}

fn to_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl IntervalScheduler {
    pub fn new(on_run: JobRunFn) -> Arc<Self> {
        Arc::new(Self {
            jobs: RwLock::new(Vec::new()),
            handles: Mutex::new(Vec::new()),
            cancel: CancellationToken::new(),
            on_run,
        })
    }

    /// Register a job. Must be called before [`start`](Self::start).
    pub async fn add(&self, job: IntervalJob) -> Result<()> {
        if job.every.is_zero() {
            return Err(Error::invalid_interval(&job.id));
        }
        let mut jobs = self.jobs.write().await;
        if jobs.iter().any(|j| j.id == job.id) {
            return Err(Error::duplicate_job(&job.id));
        }
        debug!(id = %job.id, every_secs = job.every.as_secs(), "job added");
        jobs.push(job);
        Ok(())
    }

    /// Spawn one timer task per registered job.
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        let mut handles = self.handles.lock().await;
        if !handles.is_empty() {
            return Err(Error::AlreadyStarted);
        }
        let jobs = self.jobs.read().await.clone();
        info!(count = jobs.len(), "starting scheduler");
        for job in jobs {
            let svc = Arc::clone(self);
            handles.push(tokio::spawn(async move {
                svc.job_loop(job).await;
            }));
        }
        Ok(())
    }

    /// Stop all timers. A run in progress is cancelled at its next await.
    pub async fn stop(&self) {
        self.cancel.cancel();
        let handles = std::mem::take(&mut *self.handles.lock().await);
        for result in join_all(handles).await {
            if let Err(e) = result {
                warn!(error = %e, "scheduler task ended abnormally");
            }
        }
        info!("scheduler stopped");
    }

    // ── Internal ────────────────────────────────────────────────────────

    async fn job_loop(&self, job: IntervalJob) {
        let every_ms = to_ms(job.every);
        let anchor = now_ms();
        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                () = self.execute(&job) => {},
            }

            let now = now_ms();
            let next = match compute_next_run(&job.id, every_ms, anchor, now) {
                Ok(next) => next,
                Err(e) => {
                    warn!(id = %job.id, error = %e, "cannot schedule job");
                    break;
                },
            };
            debug!(id = %job.id, in_ms = next.saturating_sub(now), "next run scheduled");

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                () = tokio::time::sleep(Duration::from_millis(next.saturating_sub(now))) => {},
            }
        }
        debug!(id = %job.id, "job loop exited");
    }

    async fn execute(&self, job: &IntervalJob) {
        let started = now_ms();
        info!(id = %job.id, "running job");

        (self.on_run)(job.id.clone()).await;

        let duration_ms = now_ms().saturating_sub(started);
        let every_ms = to_ms(job.every);
        if duration_ms > every_ms {
            warn!(
                id = %job.id,
                duration_ms,
                every_ms,
                "job overran its interval; missed ticks are skipped"
            );
        } else {
            debug!(id = %job.id, duration_ms, "job finished");
        }
    }
}
