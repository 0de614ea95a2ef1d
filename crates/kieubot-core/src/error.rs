use thiserror::Error;

/// Retrieval error taxonomy. No retries or fallback happen at this layer;
/// recovery policy belongs to the caller.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, Error>;
