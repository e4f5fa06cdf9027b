//! Umbrella crate for the FaceSearch pipeline.
//!
//! Stitches the three stages together behind one API entry point:
//! [`Embedder`] turns a face image into a fixed-length vector,
//! [`PersonStore`] persists and k-NN-searches registered identities, and
//! [`FaceMatcher`] applies the threshold policy on top. [`PersonService`]
//! is the composed register/search surface the HTTP server and the bulk
//! CLI both sit on.
//!
//! ## Example
//!
//! ```no_run
//! use facesearch::{AppConfig, build_service, MatchOutcome};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let cfg = AppConfig::from_file("facesearch.yaml")?;
//! let service = build_service(&cfg)?;
//!
//! let image = std::fs::read("query.jpg")?;
//! match service.find_by_image(image).await? {
//!     MatchOutcome::Found(hit) => println!("{} ({})", hit.person.full_name, hit.score),
//!     MatchOutcome::NotFound => println!("no registered match"),
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod service;

pub use crate::config::{AppConfig, ConfigError};
pub use crate::service::{PersonService, RegistrationAck, RegistrationEntry, ServiceError};

pub use embedder::{EmbedError, Embedder, EmbedderConfig, FaceEmbedding};
pub use matcher::{FaceMatcher, MatchConfig, MatchError, MatchOutcome};
pub use store::{
    BackendConfig, PersonFields, PersonRecord, PersonStore, SearchHit, StoreConfig, StoreError,
};

use std::sync::Arc;

/// Build an embedder from config, honoring the compiled model features.
///
/// With the `model-onnx` feature enabled and a `model_path` configured this
/// loads the ONNX model; otherwise it falls back to the deterministic stub.
pub fn build_embedder(cfg: &EmbedderConfig) -> Result<Embedder, EmbedError> {
    #[cfg(feature = "model-onnx")]
    if cfg.model_path.is_some() {
        return Embedder::with_onnx_model(cfg.clone());
    }
    Embedder::with_stub_model(cfg.clone())
}

/// Wire a full [`PersonService`] from the application config.
///
/// Does not touch the network: the engine connection is exercised lazily on
/// first use (or explicitly via [`PersonStore::ping`]).
pub fn build_service(cfg: &AppConfig) -> Result<PersonService, ServiceError> {
    let embedder = Arc::new(build_embedder(&cfg.embedder)?);
    let store = Arc::new(PersonStore::new(cfg.store.clone())?);
    PersonService::new(embedder, store, cfg.matcher.clone())
}
