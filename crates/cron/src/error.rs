use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("job {job_id}: interval must be greater than zero")]
    InvalidInterval { job_id: String },

    #[error("job already scheduled: {job_id}")]
    DuplicateJob { job_id: String },

    #[error("scheduler already started")]
    AlreadyStarted,
}

impl Error {
    #[must_use]
    pub fn invalid_interval(job_id: impl Into<String>) -> Self {
        Self::InvalidInterval {
            job_id: job_id.into(),
        }
    }

    #[must_use]
    pub fn duplicate_job(job_id: impl Into<String>) -> Self {
        Self::DuplicateJob {
            job_id: job_id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
