//! Data types for stored documents and search results.

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::{MmSearchError, Result};

/// The kind of content a [`Document`] holds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Plain text, stored verbatim.
    Text,
    /// Raw image bytes, stored as base64 text.
    Image,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Text => "text",
            MediaType::Image => "image",
        }
    }
}

/// Metadata attached to every stored document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Sequential identifier assigned at ingestion time.
    pub id: u64,
    /// Whether the content is text or a base64-encoded image.
    pub media_type: MediaType,
    /// Source path of an image document. Always `None` for text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// A stored item: text or base64 image content plus its metadata.
///
/// Documents are created once during ingestion and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// Plain text for text documents, base64 (standard, padded) for images.
    pub content: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    /// Create a text document.
    pub fn text(id: u64, text: impl Into<String>) -> Self {
        Self {
            content: text.into(),
            metadata: DocumentMetadata { id, media_type: MediaType::Text, path: None },
        }
    }

    /// Create an image document, base64-encoding `bytes`.
    pub fn image(id: u64, path: impl AsRef<Path>, bytes: &[u8]) -> Self {
        Self {
            content: STANDARD.encode(bytes),
            metadata: DocumentMetadata {
                id,
                media_type: MediaType::Image,
                path: Some(path.as_ref().to_string_lossy().into_owned()),
            },
        }
    }

    pub fn id(&self) -> u64 {
        self.metadata.id
    }

    pub fn media_type(&self) -> MediaType {
        self.metadata.media_type
    }

    /// Decode the original image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MmSearchError::VectorStore`] for text documents and
    /// [`MmSearchError::Decode`] when the stored content is not valid base64.
    pub fn decode_image(&self) -> Result<Vec<u8>> {
        if self.metadata.media_type != MediaType::Image {
            return Err(MmSearchError::VectorStore {
                backend: "Document".into(),
                message: format!("document {} is not an image", self.metadata.id),
            });
        }
        Ok(STANDARD.decode(&self.content)?)
    }

    /// The last segment of the stored path, if this is an image with a path.
    pub fn file_name(&self) -> Option<&str> {
        let path = self.metadata.path.as_deref()?;
        Path::new(path).file_name().and_then(|name| name.to_str())
    }
}

/// A retrieved [`Document`] paired with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub document: Document,
    /// Cosine similarity to the query (higher is more relevant).
    pub score: f32,
}
