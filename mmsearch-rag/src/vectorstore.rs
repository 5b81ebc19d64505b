//! Vector store trait for storing and searching embedded documents.

use async_trait::async_trait;

use crate::document::{Document, SearchResult};
use crate::error::Result;

/// A storage backend pairing vector embeddings with [`Document`]s.
///
/// Vectors and documents are kept pairwise aligned in insertion order.
///
/// # Example
///
/// ```rust,ignore
/// use mmsearch_rag::{FlatVectorStore, VectorStore};
///
/// let store = FlatVectorStore::new();
/// store.add_vectors(vec![embedding], vec![document]).await?;
/// let results = store.similarity_search_with_score(&query_embedding, 3).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Append `(vector, document)` pairs in order.
    ///
    /// Fails if the two lists differ in length or a vector's dimension does
    /// not match the store.
    async fn add_vectors(&self, vectors: Vec<Vec<f32>>, documents: Vec<Document>) -> Result<()>;

    /// Return the `k` documents most similar to `query`.
    ///
    /// Results are ordered by descending similarity score, best match first.
    async fn similarity_search_with_score(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>>;

    /// Number of stored documents.
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
