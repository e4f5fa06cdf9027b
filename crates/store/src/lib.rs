//! # FaceSearch Store (`store`)
//!
//! Engine-agnostic person document store: the schema that makes face
//! embeddings searchable, validated writes, and cosine k-NN queries.
//!
//! The engine itself is opaque behind the [`SearchEngine`] trait. Out of the
//! box there are two implementations:
//!
//! - [`ElasticBackend`] — Elasticsearch 8.x over HTTP, the production
//!   engine. One index per deployment: a `dense_vector` field
//!   (dimensionality D, cosine similarity) plus keyword fields for each
//!   biographic attribute and a date field for `birth_date`.
//! - [`MemoryBackend`] — exact in-process cosine scan with the same score
//!   scale, for tests and ephemeral use.
//!
//! [`PersonStore`] is the adapter callers use: it enforces the persistence
//! invariants (non-empty embedding of exactly D values, parseable birth
//! date) before anything reaches the engine, and never exposes stored
//! embeddings through search results.
//!
//! ## Example
//!
//! ```
//! use store::{BackendConfig, PersonStore, StoreConfig};
//!
//! # async fn demo() -> Result<(), store::StoreError> {
//! let cfg = StoreConfig::new().with_backend(BackendConfig::in_memory());
//! let store = PersonStore::new(cfg)?;
//! store.ensure_schema().await?;
//! # Ok(())
//! # }
//! ```

mod backend;
mod record;

pub use crate::backend::{BackendConfig, ElasticBackend, MemoryBackend, SearchEngine};
pub use crate::record::{PersonFields, PersonRecord, SearchHit, BIRTH_DATE_FORMAT};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing engine cannot be reached or refuses credentials.
    /// Fatal for the request; the store never retries internally.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// A document or query violates the index schema (dimensionality,
    /// date format, field types).
    #[error("schema violation: {0}")]
    SchemaViolation(String),
    /// Any other engine-side failure, including partially applied bulk
    /// batches.
    #[error("backend error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Config for initializing the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Engine selection and connection details.
    #[serde(default)]
    pub backend: BackendConfig,
    /// Vector dimensionality D declared in the index mapping. Writes with
    /// any other length are rejected before reaching the engine.
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            embedding_dim: default_embedding_dim(),
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(mut self, backend: BackendConfig) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_embedding_dim(mut self, dim: usize) -> Self {
        self.embedding_dim = dim;
        self
    }
}

fn default_embedding_dim() -> usize {
    128
}

/// Document store adapter over a pluggable [`SearchEngine`].
pub struct PersonStore {
    engine: Box<dyn SearchEngine>,
    cfg: StoreConfig,
}

impl PersonStore {
    /// Build the engine described by the config and wrap it.
    pub fn new(cfg: StoreConfig) -> Result<Self, StoreError> {
        let engine = cfg.backend.build()?;
        Ok(Self::with_engine(cfg, engine))
    }

    /// Wrap an explicit engine (e.g. a test double).
    pub fn with_engine(cfg: StoreConfig, engine: Box<dyn SearchEngine>) -> Self {
        Self { engine, cfg }
    }

    /// Declared vector dimensionality D.
    pub fn embedding_dim(&self) -> usize {
        self.cfg.embedding_dim
    }

    /// Idempotently ensure the index exists with the deployment schema.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.engine.ensure_schema(self.cfg.embedding_dim).await
    }

    /// Persist one record. Duplicate registrations are accepted; identity
    /// resolution happens at search time, not write time.
    pub async fn insert(&self, record: &PersonRecord) -> Result<(), StoreError> {
        record.validate(self.cfg.embedding_dim)?;
        self.engine.index_document(record).await?;
        tracing::info!(person = %record.fields.full_name, "indexed person record");
        Ok(())
    }

    /// Persist many records in one batch. If any record fails validation
    /// the whole batch is rejected and nothing is written; engine-level
    /// partial failure likewise surfaces as an error for the whole batch.
    pub async fn bulk_insert(&self, records: &[PersonRecord]) -> Result<(), StoreError> {
        for record in records {
            record.validate(self.cfg.embedding_dim)?;
        }
        self.engine.bulk_index(records).await?;
        tracing::info!(count = records.len(), "bulk indexed person records");
        Ok(())
    }

    /// Up to `k` candidates ranked by descending similarity to `vector`.
    /// `num_candidates` must be at least `k`.
    pub async fn knn_search(
        &self,
        vector: &[f32],
        k: usize,
        num_candidates: usize,
    ) -> Result<Vec<SearchHit>, StoreError> {
        if k == 0 {
            return Err(StoreError::SchemaViolation(
                "k must be greater than zero".into(),
            ));
        }
        if num_candidates < k {
            return Err(StoreError::SchemaViolation(format!(
                "num_candidates ({num_candidates}) must be >= k ({k})"
            )));
        }
        if vector.len() != self.cfg.embedding_dim {
            return Err(StoreError::SchemaViolation(format!(
                "query vector length {} does not match index dimensionality {}",
                vector.len(),
                self.cfg.embedding_dim
            )));
        }
        self.engine.knn_search(vector, k, num_candidates).await
    }

    /// Administrative whole-index deletion.
    pub async fn delete_index(&self) -> Result<(), StoreError> {
        self.engine.delete_index().await
    }

    /// Connectivity check against the engine.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.engine.ping().await
    }
}
