//! Vertex AI multimodal embedding provider.
//!
//! Calls the `multimodalembedding` model's `:predict` endpoint directly with
//! `reqwest`. Text and images are embedded into the same vector space.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{MmSearchError, Result};

const PROVIDER: &str = "VertexAI";

/// The default Vertex AI region.
const DEFAULT_LOCATION: &str = "us-central1";

/// The default multimodal embedding model.
const DEFAULT_MODEL: &str = "multimodalembedding@001";

/// The default output dimensionality of `multimodalembedding@001`.
const DEFAULT_DIMENSIONS: usize = 1408;

/// Output sizes the model accepts for the `dimension` parameter.
const SUPPORTED_DIMENSIONS: [usize; 4] = [128, 256, 512, 1408];

/// An [`EmbeddingProvider`] backed by the Vertex AI multimodal embedding API.
///
/// # Configuration
///
/// - `location` – defaults to `us-central1`.
/// - `model` – defaults to `multimodalembedding@001`.
/// - `dimension` – optional lower output dimensionality (128, 256 or 512).
/// - `access_token` – an OAuth2 bearer token, from the constructor or the
///   `GOOGLE_ACCESS_TOKEN` environment variable.
///
/// # Example
///
/// ```rust,ignore
/// use mmsearch_rag::vertex::VertexMultimodalEmbeddingProvider;
///
/// let provider = VertexMultimodalEmbeddingProvider::from_env()?;
/// let embedding = provider.embed_image(&std::fs::read("cat.jpg")?).await?;
/// ```
pub struct VertexMultimodalEmbeddingProvider {
    client: reqwest::Client,
    project_id: String,
    location: String,
    model: String,
    access_token: String,
    base_url: Option<String>,
    dimensions: usize,
    /// If set, passed to the API as `parameters.dimension`.
    request_dimension: Option<usize>,
}

impl VertexMultimodalEmbeddingProvider {
    /// Create a new provider for the given project and access token.
    pub fn new(project_id: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        let project_id = project_id.into();
        let access_token = access_token.into();
        if project_id.is_empty() {
            return Err(embedding_error("project id must not be empty"));
        }
        if access_token.is_empty() {
            return Err(embedding_error("access token must not be empty"));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            project_id,
            location: DEFAULT_LOCATION.into(),
            model: DEFAULT_MODEL.into(),
            access_token,
            base_url: None,
            dimensions: DEFAULT_DIMENSIONS,
            request_dimension: None,
        })
    }

    /// Create a new provider from `GOOGLE_CLOUD_PROJECT`, `GOOGLE_ACCESS_TOKEN`
    /// and the optional `GOOGLE_CLOUD_LOCATION` environment variables.
    pub fn from_env() -> Result<Self> {
        let project_id = std::env::var("GOOGLE_CLOUD_PROJECT")
            .map_err(|_| embedding_error("GOOGLE_CLOUD_PROJECT environment variable not set"))?;
        let access_token = std::env::var("GOOGLE_ACCESS_TOKEN")
            .map_err(|_| embedding_error("GOOGLE_ACCESS_TOKEN environment variable not set"))?;

        let provider = Self::new(project_id, access_token)?;
        Ok(match std::env::var("GOOGLE_CLOUD_LOCATION") {
            Ok(location) if !location.is_empty() => provider.with_location(location),
            _ => provider,
        })
    }

    /// Set the Vertex AI region (e.g. `europe-west4`).
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the scheme and host the request is sent to.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Request a lower output dimensionality.
    ///
    /// # Errors
    ///
    /// Returns [`MmSearchError::Config`] unless `dims` is one of 128, 256, 512
    /// or 1408.
    pub fn with_dimension(mut self, dims: usize) -> Result<Self> {
        if !SUPPORTED_DIMENSIONS.contains(&dims) {
            return Err(MmSearchError::Config(format!(
                "unsupported embedding dimension {dims}, expected one of {SUPPORTED_DIMENSIONS:?}"
            )));
        }
        self.dimensions = dims;
        self.request_dimension = Some(dims);
        Ok(self)
    }

    fn endpoint(&self) -> String {
        let base = match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", self.location),
        };
        format!(
            "{base}/v1/projects/{}/locations/{}/publishers/google/models/{}:predict",
            self.project_id, self.location, self.model
        )
    }

    fn request<'a>(&self, instance: Instance<'a>) -> PredictRequest<'a> {
        PredictRequest {
            instances: vec![instance],
            parameters: self.request_dimension.map(|dimension| Parameters { dimension }),
        }
    }

    async fn predict(&self, request: &PredictRequest<'_>, kind: EmbeddingKind) -> Result<Vec<f32>> {
        let url = self.endpoint();
        debug!(provider = PROVIDER, model = %self.model, kind = kind.as_str(), "sending predict request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                embedding_error(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = PROVIDER, %status, "API error");
            return Err(embedding_error(format!("API returned {status}: {detail}")));
        }

        let predict_response: PredictResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            embedding_error(format!("failed to parse response: {e}"))
        })?;

        extract_embedding(predict_response, kind, self.dimensions)
    }
}

// ── Vertex AI request/response types ───────────────────────────────

#[derive(Serialize)]
struct PredictRequest<'a> {
    instances: Vec<Instance<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<Parameters>,
}

#[derive(Serialize)]
struct Instance<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<ImageInput>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageInput {
    bytes_base64_encoded: String,
}

#[derive(Serialize)]
struct Parameters {
    dimension: usize,
}

#[derive(Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    text_embedding: Option<Vec<f32>>,
    image_embedding: Option<Vec<f32>>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Debug, Clone, Copy)]
enum EmbeddingKind {
    Text,
    Image,
}

impl EmbeddingKind {
    fn as_str(self) -> &'static str {
        match self {
            EmbeddingKind::Text => "text",
            EmbeddingKind::Image => "image",
        }
    }
}

fn embedding_error(message: impl Into<String>) -> MmSearchError {
    MmSearchError::Embedding { provider: PROVIDER.into(), message: message.into() }
}

fn extract_embedding(
    response: PredictResponse,
    kind: EmbeddingKind,
    expected_dimensions: usize,
) -> Result<Vec<f32>> {
    let prediction = response
        .predictions
        .into_iter()
        .next()
        .ok_or_else(|| embedding_error("API returned no predictions"))?;

    let embedding = match kind {
        EmbeddingKind::Text => prediction.text_embedding,
        EmbeddingKind::Image => prediction.image_embedding,
    }
    .ok_or_else(|| embedding_error(format!("prediction has no {} embedding", kind.as_str())))?;

    if embedding.len() != expected_dimensions {
        return Err(embedding_error(format!(
            "expected {expected_dimensions} dimensions, got {}",
            embedding.len()
        )));
    }
    Ok(embedding)
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for VertexMultimodalEmbeddingProvider {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, text_len = text.len(), "embedding text");
        let request = self.request(Instance { text: Some(text), image: None });
        self.predict(&request, EmbeddingKind::Text).await
    }

    async fn embed_image(&self, bytes: &[u8]) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, image_bytes = bytes.len(), "embedding image");
        let image = ImageInput { bytes_base64_encoded: STANDARD.encode(bytes) };
        let request = self.request(Instance { text: None, image: Some(image) });
        self.predict(&request, EmbeddingKind::Image).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
