//! Engine Configuration

use crate::error::{EngineError, Result};

/// Default embedding dimension (MiniLM-L6 sized sentence embeddings)
pub const DEFAULT_DIMENSION: usize = 384;

/// Stores smaller than this are scanned on the calling thread
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 1024;

/// Rows per worker task in a parallel scan
pub const DEFAULT_CHUNK_ROWS: usize = 256;

/// Which similarity kernel to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KernelChoice {
    /// Widest kernel the build target supports
    #[default]
    Auto,
    /// Portable element-at-a-time loop
    Scalar,
    /// 8-lane chunked kernel
    Wide,
}

/// What `append` does with an identifier that is already indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Fail with `IdentifierConflict`, store untouched
    #[default]
    Reject,
    /// Append anyway and repoint the lookup to the new row.
    /// The old row stays in the scan.
    Overwrite,
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Fixed embedding dimension
    pub dimension: usize,

    /// Number of search worker threads (0 = rayon global pool)
    pub num_threads: usize,

    /// Similarity kernel selection
    pub kernel: KernelChoice,

    /// Duplicate identifier handling
    pub duplicate_policy: DuplicatePolicy,

    /// Stores with fewer rows than this are scanned on the calling thread
    pub parallel_threshold: usize,

    /// Rows handed to one worker task during a parallel scan
    pub chunk_rows: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
            num_threads: 0,
            kernel: KernelChoice::Auto,
            duplicate_policy: DuplicatePolicy::Reject,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            chunk_rows: DEFAULT_CHUNK_ROWS,
        }
    }
}

impl EngineConfig {
    /// Set embedding dimension
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Set worker thread count
    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn with_kernel(mut self, kernel: KernelChoice) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Set the row count at which searches go parallel
    pub fn with_parallel_threshold(mut self, rows: usize) -> Self {
        self.parallel_threshold = rows;
        self
    }

    pub fn with_chunk_rows(mut self, rows: usize) -> Self {
        self.chunk_rows = rows;
        self
    }

    /// Worker count a search will actually use
    pub fn effective_threads(&self) -> usize {
        if self.num_threads == 0 {
            num_cpus::get()
        } else {
            self.num_threads
        }
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(EngineError::InvalidConfig(
                "dimension must be greater than zero".to_string(),
            ));
        }
        if self.chunk_rows == 0 {
            return Err(EngineError::InvalidConfig(
                "chunk_rows must be greater than zero".to_string(),
            ));
        }
        if self.chunk_rows.checked_mul(self.dimension).is_none() {
            return Err(EngineError::InvalidConfig(format!(
                "chunk_rows {} x dimension {} overflows usize",
                self.chunk_rows, self.dimension
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.dimension, 384);
        assert_eq!(config.kernel, KernelChoice::Auto);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
        assert_eq!(config.parallel_threshold, DEFAULT_PARALLEL_THRESHOLD);
        assert_eq!(config.chunk_rows, DEFAULT_CHUNK_ROWS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::default()
            .with_dimension(8)
            .with_threads(2)
            .with_kernel(KernelChoice::Scalar)
            .with_duplicate_policy(DuplicatePolicy::Overwrite)
            .with_parallel_threshold(0)
            .with_chunk_rows(3);
        assert_eq!(config.dimension, 8);
        assert_eq!(config.effective_threads(), 2);
        assert_eq!(config.kernel, KernelChoice::Scalar);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Overwrite);
        assert_eq!(config.parallel_threshold, 0);
        assert_eq!(config.chunk_rows, 3);
    }

    #[test]
    fn test_auto_threads() {
        assert!(EngineConfig::default().effective_threads() >= 1);
    }

    #[test]
    fn test_validate_rejects_zero() {
        assert!(matches!(
            EngineConfig::default().with_dimension(0).validate(),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(matches!(
            EngineConfig::default().with_chunk_rows(0).validate(),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_chunk_overflow() {
        let config = EngineConfig::default()
            .with_dimension(4)
            .with_parallel_threshold(0)
            .with_chunk_rows(usize::MAX / 2 + 1);
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidConfig(_))
        ));

        let largest = EngineConfig::default()
            .with_dimension(4)
            .with_chunk_rows(usize::MAX / 4);
        assert!(largest.validate().is_ok());
    }
}
