//! Brute-Force Search
//!
//! Exhaustive cosine scan with a threshold filter and top-k selection.
//!
//! Large stores are split into chunks of rows; every rayon task keeps its own
//! bounded min-heap and the heaps are merged after the join, so the hot loop
//! takes no locks. Small stores are scanned on the calling thread with the
//! same heap.
//!
//! Ordering among results with equal scores is not guaranteed.

use rayon::prelude::*;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use super::similarity::Kernel;
use super::store::{DocId, VectorStore};
use crate::config::{DEFAULT_CHUNK_ROWS, DEFAULT_PARALLEL_THRESHOLD};

/// Results returned when the caller does not say
pub const DEFAULT_TOP_K: usize = 10;

/// Inclusive score floor used when the caller does not say
pub const DEFAULT_MIN_SIMILARITY: f32 = 0.0;

/// One ranked hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    pub id: DocId,
    pub score: f32,
}

/// Candidate kept in a worker's heap, keyed by row position
#[derive(Debug, Clone, Copy)]
struct ScoredEntry {
    score: f32,
    position: usize,
}

impl PartialEq for ScoredEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoredEntry {}

impl PartialOrd for ScoredEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.position.cmp(&self.position))
    }
}

/// Bounded collection of the k best entries seen so far
struct TopK {
    k: usize,
    heap: BinaryHeap<Reverse<ScoredEntry>>,
}

impl TopK {
    fn new(k: usize, rows: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::with_capacity(k.min(rows) + 1),
        }
    }

    #[inline]
    fn push(&mut self, entry: ScoredEntry) {
        if self.heap.len() < self.k {
            self.heap.push(Reverse(entry));
        } else if let Some(Reverse(worst)) = self.heap.peek() {
            if entry > *worst {
                self.heap.pop();
                self.heap.push(Reverse(entry));
            }
        }
    }

    fn merge(mut self, mut other: TopK) -> TopK {
        // Fold the smaller heap into the larger one
        if self.heap.len() < other.heap.len() {
            std::mem::swap(&mut self, &mut other);
        }
        for Reverse(entry) in other.heap {
            self.push(entry);
        }
        self
    }

    /// Best first
    fn into_sorted(self) -> Vec<ScoredEntry> {
        let mut entries: Vec<ScoredEntry> = self.heap.into_iter().map(|r| r.0).collect();
        entries.sort_unstable_by(|a, b| b.cmp(a));
        entries
    }
}

/// Read-only scan over a store
#[derive(Debug, Clone, Copy)]
pub struct Searcher<'a> {
    store: &'a VectorStore,
    kernel: Kernel,
    parallel_threshold: usize,
    chunk_rows: usize,
}

impl<'a> Searcher<'a> {
    pub fn new(store: &'a VectorStore, kernel: Kernel) -> Self {
        Self {
            store,
            kernel,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            chunk_rows: DEFAULT_CHUNK_ROWS,
        }
    }

    /// Rows below which the scan stays on the calling thread
    pub fn parallel_threshold(mut self, rows: usize) -> Self {
        self.parallel_threshold = rows;
        self
    }

    /// Rows per rayon task. Zero is treated as one.
    pub fn chunk_rows(mut self, rows: usize) -> Self {
        self.chunk_rows = rows.max(1);
        self
    }

    /// Top `top_k` rows with `score >= min_similarity`, best first.
    ///
    /// `query` must already have the store's dimension.
    pub fn search(&self, query: &[f32], top_k: usize, min_similarity: f32) -> Vec<SearchResult> {
        debug_assert_eq!(query.len(), self.store.dimension());

        if top_k == 0 || self.store.is_empty() {
            return Vec::new();
        }

        let top = if self.store.len() >= self.parallel_threshold {
            self.scan_parallel(query, top_k, min_similarity)
        } else {
            self.scan_sequential(query, top_k, min_similarity)
        };

        let ids = self.store.ids();
        top.into_sorted()
            .into_iter()
            .map(|entry| SearchResult {
                id: ids[entry.position],
                score: entry.score,
            })
            .collect()
    }

    /// One result list per query, in input order
    pub fn search_batch<Q>(
        &self,
        queries: &[Q],
        top_k: usize,
        min_similarity: f32,
    ) -> Vec<Vec<SearchResult>>
    where
        Q: AsRef<[f32]> + Sync,
    {
        queries
            .par_iter()
            .map(|query| self.search(query.as_ref(), top_k, min_similarity))
            .collect()
    }

    #[inline]
    fn scan_rows(
        &self,
        rows: &[f32],
        base: usize,
        query: &[f32],
        min_similarity: f32,
        top: &mut TopK,
    ) {
        let dim = self.store.dimension();
        for (offset, row) in rows.chunks_exact(dim).enumerate() {
            let score = self.kernel.cosine(query, row);
            // NaN never passes
            if score >= min_similarity {
                top.push(ScoredEntry {
                    score,
                    position: base + offset,
                });
            }
        }
    }

    fn scan_sequential(&self, query: &[f32], top_k: usize, min_similarity: f32) -> TopK {
        let mut top = TopK::new(top_k, self.store.len());
        self.scan_rows(self.store.data(), 0, query, min_similarity, &mut top);
        top
    }

    fn scan_parallel(&self, query: &[f32], top_k: usize, min_similarity: f32) -> TopK {
        // rows * dimension is the buffer length, so this product cannot overflow
        let chunk_rows = self.chunk_rows.min(self.store.len());

        self.store
            .data()
            .par_chunks(chunk_rows * self.store.dimension())
            .enumerate()
            .map(|(chunk_idx, chunk)| {
                let mut local = TopK::new(top_k, chunk_rows);
                self.scan_rows(chunk, chunk_idx * chunk_rows, query, min_similarity, &mut local);
                local
            })
            .reduce(|| TopK::new(top_k, 0), TopK::merge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DuplicatePolicy;

    fn create_test_store() -> VectorStore {
        let mut store = VectorStore::new(4, DuplicatePolicy::Reject);
        store.append(1, &[1.0, 0.0, 0.0, 0.0]).unwrap();
        store.append(2, &[0.0, 1.0, 0.0, 0.0]).unwrap();
        store.append(3, &[1.0, 1.0, 0.0, 0.0]).unwrap();
        store
    }

    fn grid_store(rows: usize, dim: usize) -> VectorStore {
        let mut store = VectorStore::new(dim, DuplicatePolicy::Reject);
        for i in 0..rows {
            let row: Vec<f32> = (0..dim)
                .map(|j| (((i * 7 + j * 13) % 23) as f32 - 11.0) / 11.0)
                .collect();
            store.append(i as DocId, &row).unwrap();
        }
        store
    }

    #[test]
    fn test_find_nearest() {
        let store = create_test_store();
        let results = Searcher::new(&store, Kernel::Wide).search(&[1.0, 0.0, 0.0, 0.0], 2, 0.0);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, 1);
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert_eq!(results[1].id, 3);
        assert!((results[1].score - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-5);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let store = create_test_store();
        let searcher = Searcher::new(&store, Kernel::Scalar);

        let results = searcher.search(&[1.0, 0.0, 0.0, 0.0], 10, 1.0);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, 1);

        let results = searcher.search(&[0.0, 0.0, 1.0, 0.0], 10, 0.5);
        assert!(results.is_empty());
    }

    #[test]
    fn test_top_k_larger_than_matches() {
        let store = create_test_store();
        let results = Searcher::new(&store, Kernel::Wide).search(&[1.0, 0.0, 0.0, 0.0], 50, 0.0);
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_top_k_zero_and_empty_store() {
        let store = create_test_store();
        assert!(Searcher::new(&store, Kernel::Wide)
            .search(&[1.0, 0.0, 0.0, 0.0], 0, 0.0)
            .is_empty());

        let empty = VectorStore::new(4, DuplicatePolicy::Reject);
        assert!(Searcher::new(&empty, Kernel::Wide)
            .search(&[1.0, 0.0, 0.0, 0.0], 5, -1.0)
            .is_empty());
    }

    #[test]
    fn test_huge_top_k_does_not_overallocate() {
        let store = create_test_store();
        let results =
            Searcher::new(&store, Kernel::Wide).search(&[1.0, 0.0, 0.0, 0.0], usize::MAX, -1.0);
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_reduce_identity_does_not_preallocate() {
        let identity = TopK::new(usize::MAX, 0);
        assert!(identity.heap.capacity() <= 1);

        let store = grid_store(2_000, 4);
        let results = Searcher::new(&store, Kernel::Wide)
            .parallel_threshold(0)
            .chunk_rows(64)
            .search(&[1.0, 0.5, 0.0, -0.5], usize::MAX, -1.0);
        assert_eq!(results.len(), 2_000);
    }

    #[test]
    fn test_merge_keeps_best_k() {
        let mut small = TopK::new(3, 0);
        let mut large = TopK::new(3, 10);
        small.push(ScoredEntry { score: 0.9, position: 0 });
        for (position, score) in [0.1, 0.5, 0.7, 0.8].into_iter().enumerate() {
            large.push(ScoredEntry { score, position: position + 1 });
        }

        let merged = small.merge(large).into_sorted();
        let scores: Vec<f32> = merged.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![0.9, 0.8, 0.7]);
    }

    #[test]
    fn test_default_tuning_matches_config() {
        let store = create_test_store();
        let searcher = Searcher::new(&store, Kernel::Wide);
        let config = crate::config::EngineConfig::default();
        assert_eq!(searcher.parallel_threshold, config.parallel_threshold);
        assert_eq!(searcher.chunk_rows, config.chunk_rows);
    }

    #[test]
    fn test_oversized_chunk_rows_is_clamped() {
        let store = grid_store(50, 4);
        let query = [0.2, 0.4, -0.1, 0.9];
        let expected = Searcher::new(&store, Kernel::Wide)
            .parallel_threshold(usize::MAX)
            .search(&query, 10, -1.0);

        for chunk_rows in [usize::MAX / 2 + 1, usize::MAX] {
            let results = Searcher::new(&store, Kernel::Wide)
                .parallel_threshold(0)
                .chunk_rows(chunk_rows)
                .search(&query, 10, -1.0);
            assert_eq!(results, expected);
        }
    }

    #[test]
    fn test_non_finite_row_scores_zero() {
        let mut store = create_test_store();
        store.append(4, &[f32::INFINITY, 1.0, 0.0, 0.0]).unwrap();
        store.append(5, &[f32::NAN, 0.0, 0.0, 0.0]).unwrap();
        store.append(6, &[2e19, 1e19, 0.0, 0.0]).unwrap();
        let query = [1.0, 0.0, 0.0, 0.0];

        for threshold in [0, usize::MAX] {
            let searcher = Searcher::new(&store, Kernel::Wide)
                .parallel_threshold(threshold)
                .chunk_rows(2);

            let results = searcher.search(&query, 10, 0.0);
            let ids: Vec<DocId> = results.iter().map(|r| r.id).collect();
            assert_eq!(&ids[..3], &[1, 6, 3]);
            assert!(results.iter().all(|r| r.score.is_finite()));
            for r in &results[3..] {
                assert_eq!(r.score, 0.0);
            }
            // 2, 4 and 5 all tie at 0.0
            assert_eq!(results.len(), 6);

            let results = searcher.search(&query, 10, 0.1);
            let ids: Vec<DocId> = results.iter().map(|r| r.id).collect();
            assert_eq!(ids, vec![1, 6, 3]);
        }
    }

    #[test]
    fn test_nan_threshold_matches_nothing() {
        let store = create_test_store();
        let results =
            Searcher::new(&store, Kernel::Wide).search(&[1.0, 0.0, 0.0, 0.0], 10, f32::NAN);
        assert!(results.is_empty());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let store = grid_store(1000, 19);
        let query: Vec<f32> = (0..19).map(|j| (j as f32 - 9.0) / 9.0).collect();

        let sequential = Searcher::new(&store, Kernel::Wide)
            .parallel_threshold(usize::MAX)
            .search(&query, 25, -1.0);
        let parallel = Searcher::new(&store, Kernel::Wide)
            .parallel_threshold(0)
            .chunk_rows(17)
            .search(&query, 25, -1.0);

        assert_eq!(sequential.len(), 25);
        let seq_scores: Vec<f32> = sequential.iter().map(|r| r.score).collect();
        let par_scores: Vec<f32> = parallel.iter().map(|r| r.score).collect();
        assert_eq!(seq_scores, par_scores);
    }

    #[test]
    fn test_results_sorted_and_filtered() {
        let store = grid_store(300, 8);
        let query = [0.3, -0.2, 0.9, 0.0, 0.1, -0.5, 0.4, 0.2];
        let results = Searcher::new(&store, Kernel::Wide)
            .parallel_threshold(0)
            .chunk_rows(8)
            .search(&query, 40, 0.2);

        assert!(results.len() <= 40);
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert!(results.iter().all(|r| r.score >= 0.2));
    }

    #[test]
    fn test_search_batch_matches_single() {
        let store = grid_store(200, 8);
        let queries = vec![
            vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.5, -0.5, 0.0, 1.0, 0.0, 0.0, 0.2],
            vec![0.0; 8],
        ];
        let searcher = Searcher::new(&store, Kernel::Wide).parallel_threshold(50);

        let batch = searcher.search_batch(&queries, 5, 0.0);
        assert_eq!(batch.len(), queries.len());
        for (query, results) in queries.iter().zip(&batch) {
            assert_eq!(results, &searcher.search(query, 5, 0.0));
        }
        // Zero query scores 0.0 against everything, which still passes the floor
        assert_eq!(batch[2].len(), 5);
    }
}
