//! # mmsearch-rag
//!
//! Multimodal (image + text) embedding and similarity search.
//!
//! Images and texts are embedded into one vector space by an
//! [`EmbeddingProvider`], stored with their [`Document`]s in a
//! [`FlatVectorStore`] that persists to a directory, and retrieved by cosine
//! similarity for a text or image [`Query`].
//!
//! ## Components
//!
//! - [`EmbeddingProvider`]: text and image embedding backend
//! - [`VertexMultimodalEmbeddingProvider`]: Vertex AI `multimodalembedding` client
//! - [`VectorStore`] / [`FlatVectorStore`]: exact search with directory persistence
//! - [`SearchPipeline`]: ingest-or-load and clear → embed → search → render
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mmsearch_rag::*;
//!
//! let pipeline = SearchPipeline::builder()
//!     .config(SearchConfig::default())
//!     .embedding_provider(Arc::new(VertexMultimodalEmbeddingProvider::from_env()?))
//!     .build()?;
//!
//! let (store, _) = pipeline.open_or_ingest(&Catalog::builtin()).await?;
//! pipeline.query_and_render(&store, &Query::text("Mammals"), &mut std::io::stdout()).await?;
//! pipeline.persist(&store).await?;
//! ```

pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod flat;
pub mod ingest;
pub mod pipeline;
pub mod query;
pub mod vectorstore;
pub mod vertex;

pub use config::{SearchConfig, SearchConfigBuilder};
pub use document::{Document, DocumentMetadata, MediaType, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{MmSearchError, Result};
pub use flat::FlatVectorStore;
pub use ingest::{Catalog, IdCounter, IngestOutcome};
pub use pipeline::{SearchPipeline, SearchPipelineBuilder};
pub use query::Query;
pub use vectorstore::VectorStore;
pub use vertex::VertexMultimodalEmbeddingProvider;
