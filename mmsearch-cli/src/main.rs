use std::sync::Arc;

use mmsearch_rag::{
    Catalog, IngestOutcome, Query, SearchConfig, SearchPipeline, VertexMultimodalEmbeddingProvider,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// The text the fixed run searches for.
const QUERY_TEXT: &str = "Mammals";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let pipeline = SearchPipeline::builder()
        .config(SearchConfig::default())
        .embedding_provider(Arc::new(VertexMultimodalEmbeddingProvider::from_env()?))
        .build()?;

    let (store, outcome) = pipeline.open_or_ingest(&Catalog::builtin()).await?;
    match outcome {
        IngestOutcome::Loaded { documents } => info!(documents, "using existing vector store"),
        IngestOutcome::Ingested { documents } => info!(documents, "built new vector store"),
    }

    let query = Query::text(QUERY_TEXT);
    let results = pipeline.query_and_render(&store, &query, &mut std::io::stdout().lock()).await?;
    info!(query = QUERY_TEXT, results = results.len(), "search finished");

    pipeline.persist(&store).await?;
    Ok(())
}
