//! Flat (exact) vector store with directory persistence.
//!
//! [`FlatVectorStore`] scores every stored vector against the query with
//! cosine similarity. It persists to a directory holding two JSON files:
//! `index.json` with the vectors and `docstore.json` with the documents, both
//! in insertion order.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::document::{Document, SearchResult};
use crate::error::{MmSearchError, Result};
use crate::vectorstore::VectorStore;

const BACKEND: &str = "Flat";

/// File holding the vectors and their dimensionality.
pub const INDEX_FILE: &str = "index.json";

/// File holding the documents, aligned with the vectors in [`INDEX_FILE`].
pub const DOCSTORE_FILE: &str = "docstore.json";

/// An exact-search vector store kept in memory and saved to a directory.
///
/// The dimension is fixed either at creation or by the first added vector.
/// All operations are async-safe via `tokio::sync::RwLock`.
///
/// # Example
///
/// ```rust,ignore
/// use mmsearch_rag::{FlatVectorStore, VectorStore};
///
/// let store = FlatVectorStore::new();
/// store.add_vectors(vectors, documents).await?;
/// store.save("vector_store").await?;
///
/// let reloaded = FlatVectorStore::load("vector_store").await?;
/// ```
#[derive(Debug, Default)]
pub struct FlatVectorStore {
    inner: RwLock<FlatIndex>,
}

#[derive(Debug, Default)]
struct FlatIndex {
    dimensions: Option<usize>,
    vectors: Vec<Vec<f32>>,
    documents: Vec<Document>,
}

#[derive(Serialize, Deserialize)]
struct IndexFile {
    dimensions: Option<usize>,
    vectors: Vec<Vec<f32>>,
}

impl FlatVectorStore {
    /// Create a new empty store whose dimension is set by the first insert.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty store that only accepts vectors of `dimensions`.
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self { inner: RwLock::new(FlatIndex { dimensions: Some(dimensions), ..Default::default() }) }
    }

    /// The dimension of stored vectors, if known.
    pub async fn dimensions(&self) -> Option<usize> {
        self.inner.read().await.dimensions
    }

    /// Snapshot of the stored documents in insertion order.
    pub async fn documents(&self) -> Vec<Document> {
        self.inner.read().await.documents.clone()
    }

    /// Whether a persisted store is present at `dir`.
    pub fn exists(dir: impl AsRef<Path>) -> bool {
        dir.as_ref().is_dir()
    }

    /// Write the store to `dir`, creating the directory if needed.
    pub async fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await.map_err(|e| MmSearchError::io(dir, e))?;

        let inner = self.inner.read().await;
        let index = serde_json::to_vec(&IndexFile {
            dimensions: inner.dimensions,
            vectors: inner.vectors.clone(),
        })?;
        let docstore = serde_json::to_vec(&inner.documents)?;

        let index_path = dir.join(INDEX_FILE);
        tokio::fs::write(&index_path, index).await.map_err(|e| MmSearchError::io(&index_path, e))?;
        let docstore_path = dir.join(DOCSTORE_FILE);
        tokio::fs::write(&docstore_path, docstore)
            .await
            .map_err(|e| MmSearchError::io(&docstore_path, e))?;

        info!(dir = %dir.display(), documents = inner.documents.len(), "saved vector store");
        Ok(())
    }

    /// Read a store previously written by [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// Returns [`MmSearchError::VectorStore`] if either file is missing or
    /// malformed, if the two files disagree in length, or if any vector does
    /// not match the recorded dimension.
    pub async fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let index: IndexFile = read_json(&dir.join(INDEX_FILE)).await?;
        let documents: Vec<Document> = read_json(&dir.join(DOCSTORE_FILE)).await?;

        if index.vectors.len() != documents.len() {
            return Err(store_error(format!(
                "corrupt store at '{}': {} vectors but {} documents",
                dir.display(),
                index.vectors.len(),
                documents.len()
            )));
        }
        if let Some(dims) = index.dimensions {
            if let Some(pos) = index.vectors.iter().position(|v| v.len() != dims) {
                return Err(store_error(format!(
                    "corrupt store at '{}': vector {pos} has {} dimensions, expected {dims}",
                    dir.display(),
                    index.vectors[pos].len()
                )));
            }
        } else if !index.vectors.is_empty() {
            return Err(store_error(format!(
                "corrupt store at '{}': vectors present without a dimension",
                dir.display()
            )));
        }

        info!(dir = %dir.display(), documents = documents.len(), "loaded vector store");
        Ok(Self {
            inner: RwLock::new(FlatIndex {
                dimensions: index.dimensions,
                vectors: index.vectors,
                documents,
            }),
        })
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| store_error(format!("failed to read '{}': {e}", path.display())))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| store_error(format!("failed to parse '{}': {e}", path.display())))
}

fn store_error(message: impl Into<String>) -> MmSearchError {
    MmSearchError::VectorStore { backend: BACKEND.into(), message: message.into() }
}

/// Compute cosine similarity between two vectors.
///
/// Accumulates in f64 so large components cannot overflow the norms.
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(&x, &y)| f64::from(x) * f64::from(y)).sum();
    let norm_a: f64 = a.iter().map(|&x| f64::from(x) * f64::from(x)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|&x| f64::from(x) * f64::from(x)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)) as f32
}

#[async_trait]
impl VectorStore for FlatVectorStore {
    async fn add_vectors(&self, vectors: Vec<Vec<f32>>, documents: Vec<Document>) -> Result<()> {
        if vectors.len() != documents.len() {
            return Err(store_error(format!(
                "got {} vectors but {} documents",
                vectors.len(),
                documents.len()
            )));
        }

        let mut inner = self.inner.write().await;
        let dims = match inner.dimensions {
            Some(dims) => dims,
            None => match vectors.first() {
                Some(first) => first.len(),
                None => return Ok(()),
            },
        };
        if let Some(bad) = vectors.iter().find(|v| v.len() != dims) {
            return Err(store_error(format!(
                "vector has {} dimensions, store expects {dims}",
                bad.len()
            )));
        }

        inner.dimensions = Some(dims);
        for document in &documents {
            debug!(id = document.id(), media_type = document.media_type().as_str(), "adding document");
        }
        inner.vectors.extend(vectors);
        inner.documents.extend(documents);
        Ok(())
    }

    async fn similarity_search_with_score(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        let inner = self.inner.read().await;
        if let Some(dims) = inner.dimensions {
            if query.len() != dims {
                return Err(store_error(format!(
                    "query has {} dimensions, store expects {dims}",
                    query.len()
                )));
            }
        }

        let mut scored: Vec<SearchResult> = inner
            .vectors
            .iter()
            .zip(inner.documents.iter())
            .map(|(vector, document)| SearchResult {
                document: document.clone(),
                score: cosine_similarity(vector, query),
            })
            .collect();

        // stable sort: equal scores keep insertion order
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    async fn len(&self) -> usize {
        self.inner.read().await.documents.len()
    }
}
