pub type Result<T> = std::result::Result<T, Error>;

/// History lookup failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source id is not one the buffer records.
    #[error("source {source_id} is not recorded")]
    UnknownSource { source_id: String },

    /// The history backend cannot answer right now.
    #[error("history unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("failed to encode history: {0}")]
    Encode(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn unknown_source(source_id: impl Into<String>) -> Self {
        Self::UnknownSource {
            source_id: source_id.into(),
        }
    }

    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}
