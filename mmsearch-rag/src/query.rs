//! Query embedding and result rendering.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::document::{MediaType, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{MmSearchError, Result};

/// A similarity query: text or raw image bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Text(String),
    Image(Vec<u8>),
}

impl Query {
    pub fn text(text: impl Into<String>) -> Self {
        Query::Text(text.into())
    }

    /// Read an image file into an image query.
    pub async fn image_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| MmSearchError::io(path, e))?;
        Ok(Query::Image(bytes))
    }

    pub fn media_type(&self) -> MediaType {
        match self {
            Query::Text(_) => MediaType::Text,
            Query::Image(_) => MediaType::Image,
        }
    }

    /// Embed the query with the call matching its kind.
    pub async fn embed(&self, provider: &dyn EmbeddingProvider) -> Result<Vec<f32>> {
        match self {
            Query::Text(text) => provider.embed_text(text).await,
            Query::Image(bytes) => provider.embed_image(bytes).await,
        }
    }
}

/// Delete the files and symlinks directly inside `dir`.
///
/// Subdirectories are left in place. The directory itself must exist; it is
/// never created. Returns the number of entries removed.
pub async fn clear_output_dir(dir: &Path) -> Result<usize> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| MmSearchError::io(dir, e))?;
    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await.map_err(|e| MmSearchError::io(dir, e))? {
        let path = entry.path();
        let file_type = entry.file_type().await.map_err(|e| MmSearchError::io(&path, e))?;
        if file_type.is_dir() {
            debug!(path = %path.display(), "leaving subdirectory in output dir");
            continue;
        }
        tokio::fs::remove_file(&path).await.map_err(|e| MmSearchError::io(&path, e))?;
        removed += 1;
    }
    debug!(dir = %dir.display(), removed, "cleared output dir");
    Ok(removed)
}

/// Print each result and write matched images into `output_dir`.
///
/// Every result gets a `[rank] score=S {metadata}` line. Text results add
/// their content on the next line; image results are decoded, written under
/// the stored path's file name, and the written path is reported instead.
/// Returns the paths of the images written.
pub async fn render_results<W: Write>(
    results: &[SearchResult],
    output_dir: &Path,
    writer: &mut W,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for (rank, result) in results.iter().enumerate() {
        let document = &result.document;
        let metadata = serde_json::to_string(&document.metadata)?;
        writeln!(writer, "[{}] score={:.4} {metadata}", rank + 1, result.score)
            .map_err(MmSearchError::Output)?;

        match document.media_type() {
            MediaType::Text => {
                writeln!(writer, "{}", document.content).map_err(MmSearchError::Output)?;
            }
            MediaType::Image => {
                let name = document.file_name().ok_or_else(|| MmSearchError::VectorStore {
                    backend: "Document".into(),
                    message: format!("image document {} has no file name", document.id()),
                })?;
                let target = output_dir.join(name);
                let bytes = document.decode_image()?;
                tokio::fs::write(&target, &bytes).await.map_err(|e| MmSearchError::io(&target, e))?;
                info!(id = document.id(), path = %target.display(), bytes = bytes.len(), "wrote matched image");
                writeln!(writer, "wrote {}", target.display()).map_err(MmSearchError::Output)?;
                written.push(target);
            }
        }
    }
    Ok(written)
}
