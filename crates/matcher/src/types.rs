use serde::{Deserialize, Serialize};
use store::{SearchHit, StoreError};
use thiserror::Error;

/// Configuration for the match policy.
///
/// All three knobs are static configuration, not learned values: the
/// matcher is a single-step classifier ("is there a sufficiently similar
/// registered face?") with no re-ranking or multi-field fusion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchConfig {
    /// Number of nearest neighbours requested from the store.
    #[serde(default = "MatchConfig::default_k")]
    pub k: usize,
    /// Approximate-search candidate pool examined before truncation to `k`.
    /// Recall/speed tradeoff of the underlying engine; must be >= `k`.
    #[serde(default = "MatchConfig::default_num_candidates")]
    pub num_candidates: usize,
    /// Minimum similarity score, on the engine's bounded `[0, 1]` scale,
    /// for a candidate to count as a match.
    #[serde(default = "MatchConfig::default_threshold")]
    pub threshold: f32,
}

impl MatchConfig {
    pub(crate) fn default_k() -> usize {
        3
    }

    pub(crate) fn default_num_candidates() -> usize {
        100
    }

    pub(crate) fn default_threshold() -> f32 {
        0.89
    }

    /// Validate the policy invariants.
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.k == 0 {
            return Err(MatchError::InvalidConfig(
                "k must be greater than zero".into(),
            ));
        }
        if self.num_candidates < self.k {
            return Err(MatchError::InvalidConfig(format!(
                "num_candidates ({}) must be >= k ({})",
                self.num_candidates, self.k
            )));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(MatchError::InvalidConfig(format!(
                "threshold ({}) must be within the engine score scale [0, 1]",
                self.threshold
            )));
        }
        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            k: Self::default_k(),
            num_candidates: Self::default_num_candidates(),
            threshold: Self::default_threshold(),
        }
    }
}

/// Result of a match query. `NotFound` is a successful query with a
/// negative answer, deliberately separate from every error kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MatchOutcome {
    /// At least one candidate cleared the threshold; this is the
    /// highest-scoring one.
    Found(SearchHit),
    /// Zero candidates returned, or none cleared the threshold.
    NotFound,
}

impl MatchOutcome {
    pub fn found(&self) -> Option<&SearchHit> {
        match self {
            MatchOutcome::Found(hit) => Some(hit),
            MatchOutcome::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, MatchOutcome::Found(_))
    }
}

/// Errors produced by the matching layer.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Invalid match policy configuration.
    #[error("invalid match config: {0}")]
    InvalidConfig(String),
    /// Store read or search failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
