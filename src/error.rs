//! Engine Errors

use crate::vector::DocId;

/// Errors raised by the vector engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// An input vector's length differs from the index dimension
    #[error("embedding dimension {actual} does not match index dimension {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Identifier already present and the duplicate policy rejects it
    #[error("document id {id} is already indexed")]
    IdentifierConflict { id: DocId },

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Fail with `DimensionMismatch` unless `actual == expected`
#[inline]
pub(crate) fn check_dimension(expected: usize, actual: usize) -> Result<()> {
    if actual != expected {
        return Err(EngineError::DimensionMismatch { expected, actual });
    }
    Ok(())
}
