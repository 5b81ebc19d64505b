//! Embedding provider trait for turning text and images into vectors.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that generates vector embeddings from text or image input.
///
/// Text and image embeddings share one vector space so that a text query can
/// retrieve images and vice versa. Every call is a single request; callers
/// await them one at a time.
///
/// # Example
///
/// ```rust,ignore
/// use mmsearch_rag::EmbeddingProvider;
///
/// let provider = MyEmbeddingProvider::new();
/// let embedding = provider.embed_text("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a text input.
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate an embedding vector for raw image bytes.
    async fn embed_image(&self, bytes: &[u8]) -> Result<Vec<f32>>;

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}
