//! Vector Store
//!
//! Append-only storage for embeddings keyed by document id. Rows live in one
//! contiguous row-major buffer so the search path can hand whole chunks of
//! rows to workers.

use hashbrown::HashMap;
use tracing::{trace, warn};

use crate::config::DuplicatePolicy;
use crate::error::{check_dimension, EngineError, Result};

/// Caller-supplied document identifier
pub type DocId = i32;

/// Append-only embedding store
#[derive(Debug, Clone)]
pub struct VectorStore {
    /// Row-major embeddings, `dimension` floats per row
    data: Vec<f32>,
    /// Identifier of each row, same index as `data` rows
    ids: Vec<DocId>,
    /// Identifier -> most recent row
    positions: HashMap<DocId, usize>,
    dimension: usize,
    policy: DuplicatePolicy,
}

impl VectorStore {
    /// Create an empty store. `dimension` must be non-zero.
    pub fn new(dimension: usize, policy: DuplicatePolicy) -> Self {
        debug_assert!(dimension > 0, "dimension must be non-zero");
        Self {
            data: Vec::new(),
            ids: Vec::new(),
            positions: HashMap::new(),
            dimension,
            policy,
        }
    }

    /// Get embedding dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored rows, including rows shadowed by a later duplicate
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Reserve room for `additional` more rows
    pub fn reserve(&mut self, additional: usize) {
        self.data.reserve(additional * self.dimension);
        self.ids.reserve(additional);
        self.positions.reserve(additional);
    }

    /// Append an embedding.
    ///
    /// On error nothing is written.
    pub fn append(&mut self, id: DocId, embedding: &[f32]) -> Result<()> {
        check_dimension(self.dimension, embedding.len())?;

        if let Some(&previous) = self.positions.get(&id) {
            match self.policy {
                DuplicatePolicy::Reject => {
                    return Err(EngineError::IdentifierConflict { id });
                }
                DuplicatePolicy::Overwrite => {
                    warn!(
                        id,
                        previous, "Duplicate document id, lookup now points at the new row"
                    );
                }
            }
        }

        let position = self.ids.len();
        self.data.extend_from_slice(embedding);
        self.ids.push(id);
        self.positions.insert(id, position);

        trace!(id, position, "Appended embedding");
        Ok(())
    }

    /// Latest embedding stored under `id`
    pub fn get(&self, id: DocId) -> Option<&[f32]> {
        self.positions.get(&id).map(|&pos| self.row(pos))
    }

    /// Row position the identifier resolves to
    pub fn position(&self, id: DocId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn contains(&self, id: DocId) -> bool {
        self.positions.contains_key(&id)
    }

    /// Embedding at a row position.
    ///
    /// Panics if `position >= len()`.
    pub fn row(&self, position: usize) -> &[f32] {
        let start = position * self.dimension;
        &self.data[start..start + self.dimension]
    }

    /// Identifiers in row order
    pub fn ids(&self) -> &[DocId] {
        &self.ids
    }

    /// Flat row-major embedding buffer
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Number of entries in the identifier lookup
    pub fn lookup_len(&self) -> usize {
        self.positions.len()
    }

    /// Approximate heap bytes held by the store.
    ///
    /// Counts embeddings, identifiers and one (id, position) pair per lookup
    /// entry. Allocator slack and hash table control bytes are not included.
    pub fn heap_bytes(&self) -> usize {
        let vectors = self.len() * self.dimension * std::mem::size_of::<f32>();
        let ids = self.len() * std::mem::size_of::<DocId>();
        let lookup =
            self.positions.len() * (std::mem::size_of::<DocId>() + std::mem::size_of::<usize>());
        vectors + ids + lookup
    }
}
