use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid topology: {0}")]
    InvalidTopology(String),
    #[error("allocation failure: {0}")]
    AllocationFailure(String),
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("background worker failed: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, Error>;
