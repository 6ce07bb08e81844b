/// Crate-wide result type for summarization.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backend answered without any text.
    #[error("{provider} returned an empty completion")]
    EmptyCompletion { provider: String },

    /// Transport or API failure from the backend.
    #[error("completion failed: {0}")]
    Provider(#[from] anyhow::Error),
}
