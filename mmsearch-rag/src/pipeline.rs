//! Search pipeline orchestrator.
//!
//! The [`SearchPipeline`] ties a [`SearchConfig`] to an [`EmbeddingProvider`]
//! and drives the two workflows: ingest-or-load at startup, and
//! clear → embed → search → render per query. The vector store is passed in
//! explicitly rather than held by the pipeline.
//!
//! # Example
//!
//! ```rust,ignore
//! use mmsearch_rag::{Catalog, Query, SearchConfig, SearchPipeline};
//!
//! let pipeline = SearchPipeline::builder()
//!     .config(SearchConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .build()?;
//!
//! let (store, _outcome) = pipeline.open_or_ingest(&Catalog::builtin()).await?;
//! pipeline.query_and_render(&store, &Query::text("Mammals"), &mut std::io::stdout()).await?;
//! pipeline.persist(&store).await?;
//! ```

use std::io::Write;
use std::sync::Arc;

use tracing::{error, info};

use crate::config::SearchConfig;
use crate::document::SearchResult;
use crate::embedding::EmbeddingProvider;
use crate::error::{MmSearchError, Result};
use crate::flat::FlatVectorStore;
use crate::ingest::{self, Catalog, IngestOutcome};
use crate::query::{Query, clear_output_dir, render_results};
use crate::vectorstore::VectorStore;

/// The ingestion and query orchestrator. Construct one via
/// [`SearchPipeline::builder()`].
pub struct SearchPipeline {
    config: SearchConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
}

impl SearchPipeline {
    /// Create a new [`SearchPipelineBuilder`].
    pub fn builder() -> SearchPipelineBuilder {
        SearchPipelineBuilder::default()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Load the store from `config.store_dir`, or ingest `catalog` into a new
    /// one when nothing is persisted there.
    pub async fn open_or_ingest(&self, catalog: &Catalog) -> Result<(FlatVectorStore, IngestOutcome)> {
        ingest::open_or_ingest(self.embedding_provider.as_ref(), &self.config.store_dir, catalog).await
    }

    /// Clear the output directory, embed `query` and return the `top_k`
    /// nearest documents, best match first.
    ///
    /// Results below the configured similarity threshold, if any, are dropped.
    ///
    /// # Errors
    ///
    /// Fails if the output directory is missing, or if embedding or search fails.
    pub async fn query(&self, store: &dyn VectorStore, query: &Query) -> Result<Vec<SearchResult>> {
        // 1. Clear previous output
        clear_output_dir(&self.config.output_dir).await?;

        // 2. Embed the query
        let embedding = query.embed(self.embedding_provider.as_ref()).await.map_err(|e| {
            error!(kind = query.media_type().as_str(), error = %e, "embedding failed during query");
            e
        })?;

        // 3. Search the vector store
        let results = store.similarity_search_with_score(&embedding, self.config.top_k).await?;

        // 4. Filter by similarity threshold
        let results: Vec<SearchResult> = match self.config.similarity_threshold {
            Some(threshold) => results.into_iter().filter(|r| r.score >= threshold).collect(),
            None => results,
        };

        info!(kind = query.media_type().as_str(), result_count = results.len(), "query completed");
        Ok(results)
    }

    /// Run [`query`](Self::query) and render its results to `writer` and the
    /// output directory.
    pub async fn query_and_render<W: Write>(
        &self,
        store: &dyn VectorStore,
        query: &Query,
        writer: &mut W,
    ) -> Result<Vec<SearchResult>> {
        let results = self.query(store, query).await?;
        render_results(&results, &self.config.output_dir, writer).await?;
        Ok(results)
    }

    /// Save `store` to `config.store_dir`.
    pub async fn persist(&self, store: &FlatVectorStore) -> Result<()> {
        store.save(&self.config.store_dir).await
    }
}

/// Builder for constructing a [`SearchPipeline`].
///
/// Both fields are required. Call [`build()`](SearchPipelineBuilder::build)
/// to validate and produce the pipeline.
#[derive(Default)]
pub struct SearchPipelineBuilder {
    config: Option<SearchConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
}

impl SearchPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: SearchConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Build the [`SearchPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`MmSearchError::Config`] if any required field is missing.
    pub fn build(self) -> Result<SearchPipeline> {
        let config =
            self.config.ok_or_else(|| MmSearchError::Config("config is required".to_string()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| MmSearchError::Config("embedding_provider is required".to_string()))?;

        Ok(SearchPipeline { config, embedding_provider })
    }
}
