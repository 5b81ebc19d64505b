//! Configuration for ingestion and query runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{MmSearchError, Result};

/// Configuration parameters for the search pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchConfig {
    /// Directory the vector store is loaded from and saved to.
    pub store_dir: PathBuf,
    /// Directory matched images are written to. Must already exist.
    pub output_dir: PathBuf,
    /// Number of nearest neighbours returned per query.
    pub top_k: usize,
    /// Minimum similarity score for results, if any.
    pub similarity_threshold: Option<f32>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("vector_store"),
            output_dir: PathBuf::from("output"),
            top_k: 3,
            similarity_threshold: None,
        }
    }
}

impl SearchConfig {
    /// Create a new builder for constructing a [`SearchConfig`].
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`SearchConfig`].
#[derive(Debug, Clone, Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Set the directory the vector store is persisted to.
    pub fn store_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.store_dir = dir.into();
        self
    }

    /// Set the directory matched images are written to.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Set the number of results returned per query.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Drop results scoring below `threshold`.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = Some(threshold);
        self
    }

    /// Build the [`SearchConfig`], validating its parameters.
    ///
    /// # Errors
    ///
    /// Returns [`MmSearchError::Config`] if:
    /// - `top_k == 0`
    /// - `store_dir` or `output_dir` is empty
    pub fn build(self) -> Result<SearchConfig> {
        if self.config.top_k == 0 {
            return Err(MmSearchError::Config("top_k must be greater than zero".to_string()));
        }
        if self.config.store_dir.as_os_str().is_empty() {
            return Err(MmSearchError::Config("store_dir must not be empty".to_string()));
        }
        if self.config.output_dir.as_os_str().is_empty() {
            return Err(MmSearchError::Config("output_dir must not be empty".to_string()));
        }
        Ok(self.config)
    }
}
