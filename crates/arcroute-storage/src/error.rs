//! Storage error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid cache data: {0}")]
    InvalidData(String),

    #[error("Cache configuration error: {0}")]
    Config(String),
}

pub type CacheResult<T> = Result<T, CacheError>;
