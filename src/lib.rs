//! VECSCAN - Brute-Force Dense Vector Search
//!
//! Exhaustive cosine-similarity search over fixed-dimension embeddings,
//! with 8-lane SIMD kernels, a rayon-parallel top-k scan and int8
//! quantization.

pub mod bench;
pub mod config;
pub mod error;
pub mod metrics;
pub mod vector;

pub use config::{
    DuplicatePolicy, EngineConfig, KernelChoice, DEFAULT_CHUNK_ROWS, DEFAULT_DIMENSION,
    DEFAULT_PARALLEL_THRESHOLD,
};
pub use error::{EngineError, Result};
pub use metrics::Metrics;
pub use vector::{DocId, Engine, QuantizedVector, SearchResult, SharedEngine};
