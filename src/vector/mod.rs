//! Vector Module
//!
//! SIMD-accelerated similarity, append-only embedding storage, exhaustive
//! top-k search and int8 quantization.

mod engine;
mod quantize;
mod search;
mod similarity;
mod store;

pub use engine::{Engine, SharedEngine};
pub use quantize::{quantize, quantize_with_params, QuantizedVector};
pub use search::{SearchResult, Searcher, DEFAULT_MIN_SIMILARITY, DEFAULT_TOP_K};
pub use similarity::{cosine_similarity, dot_product, magnitude, Kernel, LANES, MAGNITUDE_EPSILON};
pub use store::{DocId, VectorStore};
