//! Vector index abstraction for stored documents.
//!
//! Defines a trait for backend-agnostic document storage and exact
//! nearest-neighbor retrieval. Embedding happens above this layer; an index
//! only sees finished vectors.

use crate::types::{Document, RetrievalResult};
use consult_core::AppResult;

/// Trait for vector index backends.
///
/// Implementations must:
/// - Keep ids unique
/// - Enforce one embedding dimension across all records
/// - Order search hits by descending cosine similarity, ties by insertion
/// - Make each call atomic with respect to concurrent callers
pub trait VectorIndex: Send + Sync {
    /// Insert new documents in one atomic step.
    ///
    /// Fails with `InvalidArgument` without writing anything if any id is
    /// repeated or already stored.
    fn insert_batch(&self, documents: &[Document]) -> AppResult<usize>;

    /// Insert or fully replace a document, keeping its insertion rank.
    fn upsert(&self, document: &Document) -> AppResult<()>;

    /// Remove a document. Returns whether it existed.
    fn delete(&self, id: &str) -> AppResult<bool>;

    /// Top-k most similar documents to the query embedding.
    fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<RetrievalResult>>;

    /// Every document in insertion order.
    fn list_all(&self) -> AppResult<Vec<Document>>;

    fn get(&self, id: &str) -> AppResult<Option<Document>>;

    fn count(&self) -> AppResult<usize>;

    /// Embedding dimension fixed by the first write, if any.
    fn dimension(&self) -> AppResult<Option<usize>>;

    /// Remove every document and forget the dimension.
    fn reset(&self) -> AppResult<()>;
}
