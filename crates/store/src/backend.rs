use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

use crate::record::{PersonRecord, SearchHit};
use crate::StoreError;

mod elastic;

pub use elastic::ElasticBackend;

/// Opaque search engine boundary.
///
/// The engine owns indexing, refresh visibility, and approximate search;
/// the store layer only validates documents and shapes requests. All calls
/// are non-blocking network (or in-process) operations with no internal
/// retry: a failure surfaces immediately to the caller.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Idempotently ensure the backing index exists with the expected
    /// schema for dimensionality `dim`. A pre-existing index is a no-op.
    async fn ensure_schema(&self, dim: usize) -> Result<(), StoreError>;

    /// Write one document. Append-only; no uniqueness constraint.
    async fn index_document(&self, record: &PersonRecord) -> Result<(), StoreError>;

    /// Write many documents in one batch. Engine-level partial failure is
    /// surfaced as an error for the whole batch, never silently accepted.
    async fn bulk_index(&self, records: &[PersonRecord]) -> Result<(), StoreError>;

    /// Return up to `k` documents ranked by descending similarity to
    /// `vector`. `num_candidates` is the approximate-search pool examined
    /// before truncation to `k`.
    async fn knn_search(
        &self,
        vector: &[f32],
        k: usize,
        num_candidates: usize,
    ) -> Result<Vec<SearchHit>, StoreError>;

    /// Administrative whole-index deletion. Not a per-record operation.
    async fn delete_index(&self) -> Result<(), StoreError>;

    /// Cheap connectivity check, used by readiness probes.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Engine selection, serde-friendly for the application config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Exact in-process search. Ephemeral; intended for tests.
    InMemory,
    /// Elasticsearch 8.x over HTTP.
    Elasticsearch {
        /// Base URL, e.g. `http://localhost:9200`.
        url: String,
        /// Index name, one index per deployment.
        index: String,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        password: Option<String>,
        /// Force `refresh=true` on writes so documents are searchable
        /// immediately. Leave off in production; the engine's refresh
        /// interval governs visibility there.
        #[serde(default)]
        refresh_on_write: bool,
    },
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::InMemory
    }
}

impl BackendConfig {
    pub fn in_memory() -> Self {
        BackendConfig::InMemory
    }

    pub fn elasticsearch(url: impl Into<String>, index: impl Into<String>) -> Self {
        BackendConfig::Elasticsearch {
            url: url.into(),
            index: index.into(),
            username: None,
            password: None,
            refresh_on_write: false,
        }
    }

    /// Build the engine described by this config.
    pub fn build(&self) -> Result<Box<dyn SearchEngine>, StoreError> {
        match self {
            BackendConfig::InMemory => Ok(Box::new(MemoryBackend::new())),
            BackendConfig::Elasticsearch {
                url,
                index,
                username,
                password,
                refresh_on_write,
            } => Ok(Box::new(ElasticBackend::new(
                url.clone(),
                index.clone(),
                username.clone(),
                password.clone(),
                *refresh_on_write,
            )?)),
        }
    }
}

/// Exact cosine search over an in-process vector of documents.
///
/// Scores use the engine scale `(1 + cos) / 2` so thresholds mean the same
/// thing here as against Elasticsearch. Ties are broken by insertion order:
/// the scan is a stable sort over the append-only document list, so repeated
/// identical queries against an unchanged index return identical rankings.
#[derive(Default)]
pub struct MemoryBackend {
    docs: RwLock<Vec<PersonRecord>>,
    schema_dim: RwLock<Option<usize>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Map raw cosine in [-1, 1] to the engine's bounded score in [0, 1].
pub(crate) fn engine_score(cos: f32) -> f32 {
    (1.0 + cos) / 2.0
}

#[async_trait]
impl SearchEngine for MemoryBackend {
    async fn ensure_schema(&self, dim: usize) -> Result<(), StoreError> {
        let mut schema = self.schema_dim.write().unwrap_or_else(|p| p.into_inner());
        match *schema {
            Some(existing) if existing != dim => Err(StoreError::SchemaViolation(format!(
                "index already exists with dimensionality {existing}, requested {dim}"
            ))),
            _ => {
                *schema = Some(dim);
                Ok(())
            }
        }
    }

    async fn index_document(&self, record: &PersonRecord) -> Result<(), StoreError> {
        let mut docs = self.docs.write().unwrap_or_else(|p| p.into_inner());
        docs.push(record.clone());
        Ok(())
    }

    async fn bulk_index(&self, records: &[PersonRecord]) -> Result<(), StoreError> {
        let mut docs = self.docs.write().unwrap_or_else(|p| p.into_inner());
        docs.extend(records.iter().cloned());
        Ok(())
    }

    async fn knn_search(
        &self,
        vector: &[f32],
        k: usize,
        _num_candidates: usize,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let docs = self.docs.read().unwrap_or_else(|p| p.into_inner());
        let mut hits: Vec<SearchHit> = docs
            .iter()
            .map(|doc| SearchHit {
                score: engine_score(cosine(vector, &doc.embedding)),
                person: doc.fields.clone(),
            })
            .collect();
        // Stable sort keeps insertion order for equal scores.
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }

    async fn delete_index(&self) -> Result<(), StoreError> {
        self.docs.write().unwrap_or_else(|p| p.into_inner()).clear();
        *self.schema_dim.write().unwrap_or_else(|p| p.into_inner()) = None;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
