//! Vector Engine
//!
//! Host-facing facade over the store, the similarity kernel, the search path
//! and the quantizer. Every operation validates vector lengths against the
//! fixed dimension before touching data.

use parking_lot::{RwLock, RwLockReadGuard};
use rayon::ThreadPoolBuilder;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{check_dimension, Result};
use crate::metrics::Metrics;

use super::quantize::{quantize, quantize_with_params, QuantizedVector};
use super::search::{SearchResult, Searcher, DEFAULT_MIN_SIMILARITY, DEFAULT_TOP_K};
use super::similarity::Kernel;
use super::store::{DocId, VectorStore};

/// Brute-force cosine search engine
///
/// `append` needs `&mut self` and searches need `&self`, so a single owner
/// can never append during a search. Use [`SharedEngine`] to share one
/// engine between threads.
pub struct Engine {
    store: VectorStore,
    config: EngineConfig,
    kernel: Kernel,
    /// Dedicated pool when `num_threads > 0`, otherwise rayon's global pool
    pool: Option<rayon::ThreadPool>,
    metrics: Arc<Metrics>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("dimension", &self.store.dimension())
            .field("count", &self.store.len())
            .field("kernel", &self.kernel)
            .field("dedicated_pool", &self.pool.is_some())
            .finish()
    }
}

impl Engine {
    /// Create an engine for `dimension`-length embeddings
    pub fn new(dimension: usize) -> Result<Self> {
        Self::with_config(EngineConfig::default().with_dimension(dimension))
    }

    /// Create with default configuration (384 dimensions)
    pub fn with_defaults() -> Result<Self> {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let kernel = Kernel::select(config.kernel);
        let pool = if config.num_threads > 0 {
            Some(
                ThreadPoolBuilder::new()
                    .num_threads(config.num_threads)
                    .thread_name(|i| format!("vecscan-worker-{}", i))
                    .build()?,
            )
        } else {
            None
        };

        info!(
            "Vector engine ready: dimension={}, kernel={}, workers={}",
            config.dimension,
            kernel.name(),
            config.effective_threads()
        );

        Ok(Self {
            store: VectorStore::new(config.dimension, config.duplicate_policy),
            config,
            kernel,
            pool,
            metrics: Arc::new(Metrics::new()),
        })
    }

    fn run<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    fn searcher(&self) -> Searcher<'_> {
        Searcher::new(&self.store, self.kernel)
            .parallel_threshold(self.config.parallel_threshold)
            .chunk_rows(self.config.chunk_rows)
    }

    /// Append an embedding under `id`.
    ///
    /// Fails with `DimensionMismatch`, or `IdentifierConflict` under the
    /// reject policy. The engine is unchanged on failure.
    pub fn append(&mut self, id: DocId, embedding: &[f32]) -> Result<()> {
        let start = Instant::now();
        self.store.append(id, embedding)?;
        self.metrics.record_append();
        self.metrics.record_operation("append", start.elapsed());
        Ok(())
    }

    /// Reserve room for `additional` more embeddings
    pub fn reserve(&mut self, additional: usize) {
        self.store.reserve(additional);
    }

    /// Up to `top_k` stored ids with similarity >= `min_similarity`, best
    /// first. Order among equal scores is unspecified.
    pub fn search(
        &self,
        query: &[f32],
        top_k: usize,
        min_similarity: f32,
    ) -> Result<Vec<SearchResult>> {
        check_dimension(self.store.dimension(), query.len())?;

        let start = Instant::now();
        let searcher = self.searcher();
        let results = self.run(|| searcher.search(query, top_k, min_similarity));
        let elapsed = start.elapsed();

        self.metrics.record_scan(self.store.len());
        self.metrics.record_operation("search", elapsed);
        debug!(
            rows = self.store.len(),
            returned = results.len(),
            elapsed_us = elapsed.as_micros() as u64,
            "Search complete"
        );

        Ok(results)
    }

    /// `search` with top_k = 10 and min_similarity = 0.0
    pub fn search_default(&self, query: &[f32]) -> Result<Vec<SearchResult>> {
        self.search(query, DEFAULT_TOP_K, DEFAULT_MIN_SIMILARITY)
    }

    /// One result list per query, in input order.
    ///
    /// Every query is validated first; one bad query fails the whole batch.
    pub fn search_batch<Q>(
        &self,
        queries: &[Q],
        top_k: usize,
        min_similarity: f32,
    ) -> Result<Vec<Vec<SearchResult>>>
    where
        Q: AsRef<[f32]> + Sync,
    {
        for query in queries {
            check_dimension(self.store.dimension(), query.as_ref().len())?;
        }

        let start = Instant::now();
        let searcher = self.searcher();
        let results = self.run(|| searcher.search_batch(queries, top_k, min_similarity));
        let elapsed = start.elapsed();

        self.metrics.record_scan(self.store.len() * queries.len());
        self.metrics.record_operation("search_batch", elapsed);
        debug!(
            queries = queries.len(),
            rows = self.store.len(),
            elapsed_us = elapsed.as_micros() as u64,
            "Batch search complete"
        );

        Ok(results)
    }

    /// Cosine similarity of two index-dimension vectors
    pub fn cosine_similarity(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        check_dimension(self.store.dimension(), a.len())?;
        check_dimension(self.store.dimension(), b.len())?;
        Ok(self.kernel.cosine(a, b))
    }

    /// int8 quantization of an index-dimension vector
    pub fn quantize(&self, vector: &[f32]) -> Result<Vec<i8>> {
        check_dimension(self.store.dimension(), vector.len())?;
        Ok(quantize(vector))
    }

    pub fn quantize_with_params(&self, vector: &[f32]) -> Result<QuantizedVector> {
        check_dimension(self.store.dimension(), vector.len())?;
        Ok(quantize_with_params(vector))
    }

    /// Stored rows, including rows shadowed by a duplicate id
    pub fn count(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn dimensionality(&self) -> usize {
        self.store.dimension()
    }

    /// Estimated bytes: engine struct + embeddings + ids + lookup entries.
    ///
    /// An estimate only; allocator and hash table overhead are ignored.
    pub fn memory_footprint(&self) -> usize {
        std::mem::size_of::<Self>() + self.store.heap_bytes()
    }

    /// Latest embedding stored under `id`
    pub fn get(&self, id: DocId) -> Option<&[f32]> {
        self.store.get(id)
    }

    pub fn contains(&self, id: DocId) -> bool {
        self.store.contains(id)
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }
}

/// Cloneable engine handle for multi-threaded hosts.
///
/// Appends take the write lock; searches and queries share the read lock.
#[derive(Clone, Debug)]
pub struct SharedEngine {
    inner: Arc<RwLock<Engine>>,
}

impl SharedEngine {
    pub fn new(engine: Engine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    pub fn append(&self, id: DocId, embedding: &[f32]) -> Result<()> {
        self.inner.write().append(id, embedding)
    }

    pub fn search(
        &self,
        query: &[f32],
        top_k: usize,
        min_similarity: f32,
    ) -> Result<Vec<SearchResult>> {
        self.inner.read().search(query, top_k, min_similarity)
    }

    pub fn search_batch<Q>(
        &self,
        queries: &[Q],
        top_k: usize,
        min_similarity: f32,
    ) -> Result<Vec<Vec<SearchResult>>>
    where
        Q: AsRef<[f32]> + Sync,
    {
        self.inner.read().search_batch(queries, top_k, min_similarity)
    }

    pub fn count(&self) -> usize {
        self.inner.read().count()
    }

    pub fn memory_footprint(&self) -> usize {
        self.inner.read().memory_footprint()
    }

    /// Read access for everything else
    pub fn read(&self) -> RwLockReadGuard<'_, Engine> {
        self.inner.read()
    }
}

impl From<Engine> for SharedEngine {
    fn from(engine: Engine) -> Self {
        Self::new(engine)
    }
}
