//! End-to-end ingestion and query tests against a temporary workspace.

mod common;

use std::path::Path;
use std::sync::Arc;

use common::{FailingEmbeddingProvider, KeywordEmbeddingProvider, image_bytes, write_catalog};
use mmsearch_rag::{
    Catalog, EmbeddingProvider, FlatVectorStore, IngestOutcome, MediaType, MmSearchError, Query,
    SearchConfig, SearchPipeline, VectorStore,
};

fn pipeline(root: &Path, provider: Arc<dyn EmbeddingProvider>, top_k: usize) -> SearchPipeline {
    let output = root.join("output");
    std::fs::create_dir_all(&output).unwrap();
    let config = SearchConfig::builder()
        .store_dir(root.join("store"))
        .output_dir(output)
        .top_k(top_k)
        .build()
        .unwrap();
    SearchPipeline::builder().config(config).embedding_provider(provider).build().unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn second_run_loads_store_without_embedding() {
    let temp = tempfile::tempdir().unwrap();
    let catalog = write_catalog(temp.path());

    let first = Arc::new(KeywordEmbeddingProvider::new());
    let pipeline_a = pipeline(temp.path(), first.clone(), 1);
    let (store, outcome) = pipeline_a.open_or_ingest(&catalog).await.unwrap();
    assert_eq!(outcome, IngestOutcome::Ingested { documents: 9 });
    assert_eq!(first.image_calls(), 6);
    assert_eq!(first.text_calls(), 3);
    pipeline_a.persist(&store).await.unwrap();

    let second = Arc::new(KeywordEmbeddingProvider::new());
    let pipeline_b = pipeline(temp.path(), second.clone(), 1);
    let (reloaded, outcome) = pipeline_b.open_or_ingest(&catalog).await.unwrap();
    assert_eq!(outcome, IngestOutcome::Loaded { documents: 9 });
    assert_eq!(second.total_calls(), 0);
    assert_eq!(reloaded.documents().await, store.documents().await);
}

#[tokio::test(flavor = "multi_thread")]
async fn ids_follow_catalog_order_images_first() {
    let temp = tempfile::tempdir().unwrap();
    let catalog = write_catalog(temp.path());
    let pipeline = pipeline(temp.path(), Arc::new(KeywordEmbeddingProvider::new()), 1);

    let (store, _) = pipeline.open_or_ingest(&catalog).await.unwrap();
    let documents = store.documents().await;

    let ids: Vec<u64> = documents.iter().map(|d| d.id()).collect();
    assert_eq!(ids, (0..9).collect::<Vec<u64>>());
    assert!(documents[..6].iter().all(|d| d.media_type() == MediaType::Image));
    assert!(documents[6..].iter().all(|d| d.media_type() == MediaType::Text));
    assert_eq!(documents[7].content, "Dogs are domesticated mammals.");
}

#[tokio::test(flavor = "multi_thread")]
async fn only_image_documents_carry_a_path() {
    let temp = tempfile::tempdir().unwrap();
    let catalog = write_catalog(temp.path());
    let pipeline = pipeline(temp.path(), Arc::new(KeywordEmbeddingProvider::new()), 1);
    let (store, _) = pipeline.open_or_ingest(&catalog).await.unwrap();
    pipeline.persist(&store).await.unwrap();

    let docstore: serde_json::Value = serde_json::from_slice(
        &std::fs::read(temp.path().join("store").join(mmsearch_rag::flat::DOCSTORE_FILE)).unwrap(),
    )
    .unwrap();
    for doc in docstore.as_array().unwrap() {
        let metadata = doc["metadata"].as_object().unwrap();
        match metadata["mediaType"].as_str().unwrap() {
            "image" => assert!(metadata["path"].is_string()),
            "text" => assert!(!metadata.contains_key("path")),
            other => panic!("unexpected mediaType {other}"),
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn image_query_returns_identical_bytes_and_writes_file() {
    let temp = tempfile::tempdir().unwrap();
    let catalog = write_catalog(temp.path());
    let pipeline = pipeline(temp.path(), Arc::new(KeywordEmbeddingProvider::new()), 1);
    let (store, _) = pipeline.open_or_ingest(&catalog).await.unwrap();

    let query = Query::image_file(&catalog.images[3]).await.unwrap();
    let mut out = Vec::new();
    let results = pipeline.query_and_render(&store, &query, &mut out).await.unwrap();

    assert_eq!(results.len(), 1);
    let top = &results[0].document;
    assert_eq!(top.id(), 3);
    assert_eq!(top.decode_image().unwrap(), image_bytes(3));

    let written = temp.path().join("output").join("parrot.jpg");
    assert_eq!(std::fs::read(written).unwrap(), image_bytes(3));
    assert!(String::from_utf8(out).unwrap().contains("parrot.jpg"));
}

#[tokio::test(flavor = "multi_thread")]
async fn mammals_query_finds_dog_text_and_clears_output() {
    let temp = tempfile::tempdir().unwrap();
    let catalog = write_catalog(temp.path());
    let pipeline = pipeline(temp.path(), Arc::new(KeywordEmbeddingProvider::new()), 1);
    let (store, _) = pipeline.open_or_ingest(&catalog).await.unwrap();

    let output = temp.path().join("output");
    std::fs::write(output.join("stale.jpg"), b"previous run").unwrap();

    let mut out = Vec::new();
    let results = pipeline.query_and_render(&store, &Query::text("Mammals"), &mut out).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].document.content, "Dogs are domesticated mammals.");
    assert_eq!(std::fs::read_dir(&output).unwrap().count(), 0);

    let printed = String::from_utf8(out).unwrap();
    assert!(printed.starts_with(r#"[1] score="#));
    assert!(printed.contains(r#"{"id":7,"mediaType":"text"}"#));
    assert!(printed.contains("Dogs are domesticated mammals.\n"));
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_output_dir_fails_before_embedding() {
    let temp = tempfile::tempdir().unwrap();
    let catalog = write_catalog(temp.path());
    let provider = Arc::new(KeywordEmbeddingProvider::new());
    let pipeline = pipeline(temp.path(), provider.clone(), 1);
    let (store, _) = pipeline.open_or_ingest(&catalog).await.unwrap();
    std::fs::remove_dir(temp.path().join("output")).unwrap();

    let calls_before = provider.total_calls();
    let err = pipeline.query(&store, &Query::text("Mammals")).await.unwrap_err();

    assert!(matches!(err, MmSearchError::Io { .. }));
    assert_eq!(provider.total_calls(), calls_before);
    assert!(!temp.path().join("output").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_image_aborts_ingestion() {
    let temp = tempfile::tempdir().unwrap();
    let mut catalog = write_catalog(temp.path());
    catalog.images.insert(2, temp.path().join("images").join("missing.jpg"));
    let provider = Arc::new(KeywordEmbeddingProvider::new());
    let pipeline = pipeline(temp.path(), provider.clone(), 1);

    let err = pipeline.open_or_ingest(&catalog).await.unwrap_err();

    assert!(matches!(err, MmSearchError::Io { .. }));
    assert_eq!(provider.image_calls(), 2);
    assert_eq!(provider.text_calls(), 0);
    assert!(!temp.path().join("store").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn embedding_failure_aborts_ingestion_without_saving() {
    let temp = tempfile::tempdir().unwrap();
    let catalog = write_catalog(temp.path());
    // call 8 is the second text, after all six images
    let provider = Arc::new(FailingEmbeddingProvider::new(8));
    let pipeline = pipeline(temp.path(), provider.clone(), 1);

    let err = pipeline.open_or_ingest(&catalog).await.unwrap_err();

    assert!(matches!(err, MmSearchError::Embedding { .. }), "unexpected error: {err}");
    assert_eq!(provider.calls(), 8);
    assert!(!temp.path().join("store").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn embedding_failure_on_first_image_stops_immediately() {
    let temp = tempfile::tempdir().unwrap();
    let catalog = write_catalog(temp.path());
    let provider = Arc::new(FailingEmbeddingProvider::new(1));
    let pipeline = pipeline(temp.path(), provider.clone(), 1);

    let err = pipeline.open_or_ingest(&catalog).await.unwrap_err();

    assert!(matches!(err, MmSearchError::Embedding { .. }));
    assert_eq!(provider.calls(), 1);
    assert!(!temp.path().join("store").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn query_embedding_failure_propagates_after_clearing_output() {
    let temp = tempfile::tempdir().unwrap();
    let provider = Arc::new(FailingEmbeddingProvider::new(1));
    let pipeline = pipeline(temp.path(), provider.clone(), 1);
    let store = FlatVectorStore::new();
    store.add_vectors(vec![vec![1.0, 0.0]], vec![mmsearch_rag::Document::text(0, "only")]).await.unwrap();

    let output = temp.path().join("output");
    std::fs::write(output.join("stale.jpg"), b"previous run").unwrap();

    let mut out = Vec::new();
    let err = pipeline.query_and_render(&store, &Query::text("Mammals"), &mut out).await.unwrap_err();

    assert!(matches!(err, MmSearchError::Embedding { .. }));
    assert_eq!(provider.calls(), 1);
    assert_eq!(std::fs::read_dir(&output).unwrap().count(), 0);
    assert!(out.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_store_dir_is_fatal_and_never_reingested() {
    let temp = tempfile::tempdir().unwrap();
    let catalog = write_catalog(temp.path());
    std::fs::create_dir_all(temp.path().join("store")).unwrap();
    let provider = Arc::new(KeywordEmbeddingProvider::new());
    let pipeline = pipeline(temp.path(), provider.clone(), 1);

    let err = pipeline.open_or_ingest(&catalog).await.unwrap_err();

    assert!(matches!(err, MmSearchError::VectorStore { .. }), "unexpected error: {err}");
    assert_eq!(provider.total_calls(), 0);
    assert_eq!(std::fs::read_dir(temp.path().join("store")).unwrap().count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn similarity_threshold_drops_weak_matches() {
    let temp = tempfile::tempdir().unwrap();
    let catalog = write_catalog(temp.path());
    std::fs::create_dir_all(temp.path().join("output")).unwrap();
    let config = SearchConfig::builder()
        .store_dir(temp.path().join("store"))
        .output_dir(temp.path().join("output"))
        .top_k(9)
        .similarity_threshold(0.5)
        .build()
        .unwrap();
    let pipeline = SearchPipeline::builder()
        .config(config)
        .embedding_provider(Arc::new(KeywordEmbeddingProvider::new()))
        .build()
        .unwrap();
    let (store, _) = pipeline.open_or_ingest(&catalog).await.unwrap();

    let results = pipeline.query(&store, &Query::text("Mammals")).await.unwrap();

    assert_eq!(results.len(), 1);
    assert!(results.iter().all(|r| r.score >= 0.5));
}

#[tokio::test(flavor = "multi_thread")]
async fn text_only_catalog_ingests_texts_from_zero() {
    let temp = tempfile::tempdir().unwrap();
    let catalog = Catalog::new(Vec::new(), vec!["one".to_string(), "two".to_string()]);
    let pipeline = pipeline(temp.path(), Arc::new(KeywordEmbeddingProvider::new()), 1);

    let (store, outcome) = pipeline.open_or_ingest(&catalog).await.unwrap();

    assert_eq!(outcome.documents(), 2);
    let ids: Vec<u64> = store.documents().await.iter().map(|d| d.id()).collect();
    assert_eq!(ids, vec![0, 1]);
    assert_eq!(store.len().await, 2);
}

#[test]
fn builder_requires_provider_and_config() {
    assert!(SearchPipeline::builder().config(SearchConfig::default()).build().is_err());
    assert!(
        SearchPipeline::builder()
            .embedding_provider(Arc::new(KeywordEmbeddingProvider::new()))
            .build()
            .is_err()
    );
}
