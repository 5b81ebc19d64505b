//! One-shot ingestion of a fixed catalog of images and texts.
//!
//! Every item gets the next id from a single [`IdCounter`] shared by the image
//! and text phases, so images take ids `0..images.len()` and texts continue
//! from there. Items are read, embedded and stored one at a time; the first
//! failure aborts the run without undoing items already added.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::document::Document;
use crate::embedding::EmbeddingProvider;
use crate::error::{MmSearchError, Result};
use crate::flat::FlatVectorStore;
use crate::vectorstore::VectorStore;

/// The items to embed when no persisted store exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub images: Vec<PathBuf>,
    pub texts: Vec<String>,
}

impl Catalog {
    pub fn new(images: Vec<PathBuf>, texts: Vec<String>) -> Self {
        Self { images, texts }
    }

    /// The built-in demonstration catalog: six images and three texts.
    pub fn builtin() -> Self {
        let images = ["cat.jpg", "dog.jpg", "horse.jpg", "parrot.jpg", "goldfish.jpg", "owl.jpg"]
            .iter()
            .map(|name| Path::new("assets/images").join(name))
            .collect();
        let texts = [
            "Cats are independent and curious pets.",
            "Dogs are domesticated mammals.",
            "Goldfish live in freshwater aquariums.",
        ]
        .iter()
        .map(|text| text.to_string())
        .collect();
        Self { images, texts }
    }

    pub fn len(&self) -> usize {
        self.images.len() + self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Monotonically increasing document id source.
#[derive(Debug, Default)]
pub struct IdCounter {
    next: u64,
}

impl IdCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the current id and advance.
    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The id the next call to [`next_id`](Self::next_id) will return.
    pub fn peek(&self) -> u64 {
        self.next
    }
}

/// What [`open_or_ingest`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A persisted store was found and loaded; nothing was embedded.
    Loaded { documents: usize },
    /// No persisted store existed; the catalog was embedded into a new one.
    Ingested { documents: usize },
}

impl IngestOutcome {
    pub fn documents(&self) -> usize {
        match self {
            IngestOutcome::Loaded { documents } | IngestOutcome::Ingested { documents } => *documents,
        }
    }
}

/// Read, embed and store each image, assigning ids from `ids`.
///
/// Returns the number of images added.
pub async fn ingest_images(
    provider: &dyn EmbeddingProvider,
    store: &dyn VectorStore,
    paths: &[PathBuf],
    ids: &mut IdCounter,
) -> Result<usize> {
    for path in paths {
        let bytes = tokio::fs::read(path).await.map_err(|e| MmSearchError::io(path, e))?;
        let id = ids.next_id();
        debug!(id, path = %path.display(), bytes = bytes.len(), "embedding image");

        let vector = provider.embed_image(&bytes).await.map_err(|e| {
            error!(id, path = %path.display(), error = %e, "image embedding failed during ingestion");
            e
        })?;
        store.add_vectors(vec![vector], vec![Document::image(id, path, &bytes)]).await?;
    }
    Ok(paths.len())
}

/// Embed and store each text, assigning ids from `ids`.
///
/// Returns the number of texts added.
pub async fn ingest_texts(
    provider: &dyn EmbeddingProvider,
    store: &dyn VectorStore,
    texts: &[String],
    ids: &mut IdCounter,
) -> Result<usize> {
    for text in texts {
        let id = ids.next_id();
        debug!(id, text_len = text.len(), "embedding text");

        let vector = provider.embed_text(text).await.map_err(|e| {
            error!(id, error = %e, "text embedding failed during ingestion");
            e
        })?;
        store.add_vectors(vec![vector], vec![Document::text(id, text.as_str())]).await?;
    }
    Ok(texts.len())
}

/// Embed the whole catalog, images first, into a fresh store.
pub async fn ingest_catalog(
    provider: &dyn EmbeddingProvider,
    catalog: &Catalog,
) -> Result<FlatVectorStore> {
    let store = FlatVectorStore::with_dimensions(provider.dimensions());
    let mut ids = IdCounter::new();

    let images = ingest_images(provider, &store, &catalog.images, &mut ids).await?;
    let texts = ingest_texts(provider, &store, &catalog.texts, &mut ids).await?;

    info!(images, texts, next_id = ids.peek(), "ingested catalog");
    Ok(store)
}

/// Load the store at `store_dir` if present, otherwise ingest `catalog`.
///
/// Loading performs no embedding calls. The returned store is not saved here;
/// callers persist it when their run ends.
pub async fn open_or_ingest(
    provider: &dyn EmbeddingProvider,
    store_dir: &Path,
    catalog: &Catalog,
) -> Result<(FlatVectorStore, IngestOutcome)> {
    if FlatVectorStore::exists(store_dir) {
        warn!(dir = %store_dir.display(), "vector store already exists, skipping ingestion");
        let store = FlatVectorStore::load(store_dir).await?;
        let documents = store.len().await;
        return Ok((store, IngestOutcome::Loaded { documents }));
    }

    info!(dir = %store_dir.display(), items = catalog.len(), "no vector store found, ingesting catalog");
    let store = ingest_catalog(provider, catalog).await?;
    let documents = store.len().await;
    Ok((store, IngestOutcome::Ingested { documents }))
}
