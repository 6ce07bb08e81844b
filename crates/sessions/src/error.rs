use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// No summary has been delivered for this pair yet.
    #[error("no context is available for {source_id} and {alias} yet")]
    NoContextAvailable { source_id: String, alias: String },
}

impl Error {
    #[must_use]
    pub fn no_context(source_id: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::NoContextAvailable {
            source_id: source_id.into(),
            alias: alias.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
