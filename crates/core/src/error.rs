use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no index file at {0}")]
    Missing(PathBuf),

    #[error("index file {path} is corrupt: {details}")]
    Corrupt { path: PathBuf, details: String },

    #[error("index format version {found} is not supported (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("index holds {found}-dimensional embeddings but the provider emits {expected}")]
    DimensionMismatch { found: usize, expected: usize },

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding provider failed: {0}")]
    Provider(String),

    #[error("provider returned {got} vectors for a batch of {expected}")]
    BatchShape { expected: usize, got: usize },

    #[error("provider returned a {got}-dimensional vector, expected {expected}")]
    WrongDimensions { expected: usize, got: usize },
}

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Embed(#[from] EmbedError),
}

pub type Result<T, E = IndexError> = std::result::Result<T, E>;
