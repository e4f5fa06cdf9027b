use std::sync::Arc;
use std::time::Instant;

use store::PersonStore;

use crate::types::{MatchConfig, MatchError, MatchOutcome};

/// Matcher for resolving a query embedding to the best registered face.
///
/// Stateless and idempotent: identical query vectors against an unchanged
/// index always produce the same outcome. Ties at equal score keep the
/// engine's stable order; the matcher does not redefine it.
pub struct FaceMatcher {
    store: Arc<PersonStore>,
    cfg: MatchConfig,
}

impl FaceMatcher {
    /// Construct a matcher over a shared store handle. The config is
    /// validated once here rather than per query.
    pub fn new(store: Arc<PersonStore>, cfg: MatchConfig) -> Result<Self, MatchError> {
        cfg.validate()?;
        Ok(Self { store, cfg })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.cfg
    }

    /// Run one thresholded k-NN query.
    ///
    /// The ranked list from the store is already descending, so the first
    /// hit that clears the threshold is the best match.
    pub async fn find_best_match(&self, query: &[f32]) -> Result<MatchOutcome, MatchError> {
        let start = Instant::now();
        let hits = self
            .store
            .knn_search(query, self.cfg.k, self.cfg.num_candidates)
            .await?;

        let candidates = hits.len();
        let best = hits.into_iter().find(|hit| hit.score >= self.cfg.threshold);
        let latency_ms = start.elapsed().as_millis();

        match best {
            Some(hit) => {
                tracing::info!(
                    score = hit.score,
                    candidates,
                    latency_ms,
                    "match found above threshold"
                );
                Ok(MatchOutcome::Found(hit))
            }
            None => {
                tracing::info!(candidates, latency_ms, "no candidate cleared the threshold");
                Ok(MatchOutcome::NotFound)
            }
        }
    }
}
