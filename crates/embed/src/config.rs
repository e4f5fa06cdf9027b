use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::EmbedError;

/// Configuration for the embedding stage.
///
/// Serde-friendly so it can be embedded in the application YAML config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedderConfig {
    /// Name of the face model, surfaced on every [`FaceEmbedding`](crate::FaceEmbedding).
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Path to the ONNX model file. Only consulted by the `model-onnx`
    /// feature; ignored when running on the stub model.
    #[serde(default)]
    pub model_path: Option<PathBuf>,

    /// Fixed embedding dimensionality D. Must match the index mapping.
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,

    /// Size of the bounded worker pool for CPU-bound model calls.
    /// Sized to available compute, not request volume.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            model_path: None,
            embedding_dim: default_embedding_dim(),
            workers: default_workers(),
        }
    }
}

impl EmbedderConfig {
    pub fn validate(&self) -> Result<(), EmbedError> {
        if self.model_name.trim().is_empty() {
            return Err(EmbedError::InvalidConfig(
                "model_name must not be empty".into(),
            ));
        }
        if self.embedding_dim == 0 {
            return Err(EmbedError::InvalidConfig(
                "embedding_dim must be greater than zero".into(),
            ));
        }
        if self.workers == 0 {
            return Err(EmbedError::InvalidConfig(
                "workers must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

fn default_model_name() -> String {
    "facenet".to_string()
}

fn default_embedding_dim() -> usize {
    128
}

fn default_workers() -> usize {
    3
}
