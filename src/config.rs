//! YAML application configuration.
//!
//! One file configures every pipeline stage. Each section maps directly
//! onto the owning crate's config struct, so defaults and validation live
//! with the component, not here.
//!
//! ## Example
//!
//! ```yaml
//! version: "1.0"
//!
//! embedder:
//!   model_name: "facenet"
//!   embedding_dim: 128
//!   workers: 3
//!
//! store:
//!   embedding_dim: 128
//!   backend:
//!     kind: elasticsearch
//!     url: "http://localhost:9200"
//!     index: "people-image-facenet"
//!     username: "admin"
//!
//! matcher:
//!   k: 3
//!   num_candidates: 100
//!   threshold: 0.89
//! ```

use std::fs;
use std::path::Path;

use embedder::EmbedderConfig;
use matcher::MatchConfig;
use serde::{Deserialize, Serialize};
use store::StoreConfig;
use thiserror::Error;

/// Errors that can occur when loading the application config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),
    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level configuration for the whole pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Configuration format version.
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub embedder: EmbedderConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub matcher: MatchConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            embedder: EmbedderConfig::default(),
            store: StoreConfig::default(),
            matcher: MatchConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load and validate a YAML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate YAML configuration from a string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.version.as_str() {
            "1" | "1.0" => {}
            v => return Err(ConfigError::UnsupportedVersion(v.to_string())),
        }
        self.embedder
            .validate()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        self.matcher
            .validate()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        if self.embedder.embedding_dim != self.store.embedding_dim {
            return Err(ConfigError::Validation(format!(
                "embedder dimensionality ({}) must match store dimensionality ({})",
                self.embedder.embedding_dim, self.store.embedding_dim
            )));
        }
        Ok(())
    }
}

fn default_version() -> String {
    "1.0".to_string()
}
