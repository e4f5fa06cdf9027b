//! # FaceSearch Matcher (`matcher`)
//!
//! Sits on top of the store layer and answers one question: is there a
//! sufficiently similar registered face for this query embedding?
//!
//! A match is a single thresholded k-NN query — k nearest neighbours are
//! fetched from the store (with a configurable approximate-search candidate
//! pool) and the first hit at or above the configured threshold wins. There
//! is no re-ranking, no multi-field fusion, and no learned threshold.
//!
//! ## Core types
//!
//! - [`MatchConfig`]: k, candidate pool size, and score threshold.
//! - [`MatchOutcome`]: `Found(best)` or `NotFound`. `NotFound` is a valid
//!   result of a successful query, never an error.
//! - [`FaceMatcher`]: the engine wiring a shared [`store::PersonStore`] to
//!   the policy.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use matcher::{FaceMatcher, MatchConfig, MatchOutcome};
//! use store::{BackendConfig, PersonStore, StoreConfig};
//!
//! # async fn demo() -> Result<(), matcher::MatchError> {
//! let store_cfg = StoreConfig::new().with_backend(BackendConfig::in_memory());
//! let store = Arc::new(PersonStore::new(store_cfg)?);
//! let matcher = FaceMatcher::new(store, MatchConfig::default())?;
//!
//! let query = vec![0.0f32; 128];
//! match matcher.find_best_match(&query).await? {
//!     MatchOutcome::Found(hit) => println!("{} score={}", hit.person.full_name, hit.score),
//!     MatchOutcome::NotFound => println!("no match"),
//! }
//! # Ok(())
//! # }
//! ```

mod engine;
mod types;

pub use crate::engine::FaceMatcher;
pub use crate::types::{MatchConfig, MatchError, MatchOutcome};
