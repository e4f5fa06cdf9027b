//! # FaceSearch Embedder (`embedder`)
//!
//! Wraps an external face recognition model behind the [`FaceModel`] trait
//! and exposes a single async entry point: image bytes in, fixed-length
//! [`FaceEmbedding`] out.
//!
//! The model call itself is CPU-bound and synchronous. To keep concurrent
//! registrations from starving each other or the transport layer, every call
//! runs on `tokio::task::spawn_blocking` behind a semaphore sized by
//! [`EmbedderConfig::workers`]. The embedder holds no cache and performs no
//! retries; every failure surfaces as a typed [`EmbedError`].
//!
//! ## Example
//!
//! ```no_run
//! use embedder::{Embedder, EmbedderConfig};
//!
//! # async fn demo(image_bytes: Vec<u8>) -> Result<(), embedder::EmbedError> {
//! let embedder = Embedder::with_stub_model(EmbedderConfig::default())?;
//! let embedding = embedder.embed(image_bytes).await?;
//! assert_eq!(embedding.vector.len(), 128);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod model;
mod normalize;

#[cfg(feature = "model-onnx")]
mod onnx;

pub use crate::config::EmbedderConfig;
pub use crate::error::EmbedError;
pub use crate::model::{FaceModel, StubFaceModel, MIN_FACE_PX};
pub use crate::normalize::l2_normalize_in_place;

#[cfg(feature = "model-onnx")]
pub use crate::onnx::OnnxFaceModel;

use std::sync::Arc;

use image::DynamicImage;
use tokio::sync::Semaphore;

/// Embedding output.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FaceEmbedding {
    /// Embedding values, length equals the configured dimensionality.
    pub vector: Vec<f32>,
    /// Name of the model that produced the vector.
    pub model_name: String,
    /// Dimension of `vector`.
    pub embedding_dim: usize,
}

/// Async facade over a [`FaceModel`] with a bounded blocking worker pool.
pub struct Embedder {
    cfg: EmbedderConfig,
    model: Arc<dyn FaceModel>,
    workers: Arc<Semaphore>,
}

impl std::fmt::Debug for Embedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Embedder")
            .field("cfg", &self.cfg)
            .field("model_dim", &self.model.dim())
            .finish_non_exhaustive()
    }
}

impl Embedder {
    /// Build an embedder around an explicit model implementation.
    pub fn new(cfg: EmbedderConfig, model: Arc<dyn FaceModel>) -> Result<Self, EmbedError> {
        cfg.validate()?;
        if model.dim() != cfg.embedding_dim {
            return Err(EmbedError::InvalidConfig(format!(
                "model dimensionality {} does not match configured embedding_dim {}",
                model.dim(),
                cfg.embedding_dim
            )));
        }
        let workers = Arc::new(Semaphore::new(cfg.workers));
        Ok(Self {
            cfg,
            model,
            workers,
        })
    }

    /// Build an embedder over the deterministic stub model.
    pub fn with_stub_model(cfg: EmbedderConfig) -> Result<Self, EmbedError> {
        let model = Arc::new(StubFaceModel::new(cfg.embedding_dim));
        Self::new(cfg, model)
    }

    /// Build an embedder over the ONNX model configured in
    /// [`EmbedderConfig::model_path`].
    #[cfg(feature = "model-onnx")]
    pub fn with_onnx_model(cfg: EmbedderConfig) -> Result<Self, EmbedError> {
        let path = cfg.model_path.clone().ok_or_else(|| {
            EmbedError::InvalidConfig("model_path is required for the ONNX model".into())
        })?;
        let model = Arc::new(OnnxFaceModel::from_file(&path, cfg.embedding_dim)?);
        Self::new(cfg, model)
    }

    /// Configured embedding dimensionality D.
    pub fn dim(&self) -> usize {
        self.cfg.embedding_dim
    }

    /// Decode `image_bytes` and compute the face embedding.
    ///
    /// Pure over its input: identical bytes always produce identical output
    /// for a deterministic model. Decoding and inference both run on the
    /// blocking pool; the caller's task only waits on the worker permit.
    pub async fn embed(&self, image_bytes: Vec<u8>) -> Result<FaceEmbedding, EmbedError> {
        let _permit = self
            .workers
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| EmbedError::Inference("embedder worker pool closed".into()))?;

        let model = Arc::clone(&self.model);
        let expected_dim = self.cfg.embedding_dim;
        let model_name = self.cfg.model_name.clone();

        let vector = tokio::task::spawn_blocking(move || {
            let image = decode_image(&image_bytes)?;
            model.represent(&image)
        })
        .await
        .map_err(|e| EmbedError::Inference(format!("embedding task failed: {e}")))??;

        if vector.len() != expected_dim {
            return Err(EmbedError::Dimension {
                expected: expected_dim,
                actual: vector.len(),
            });
        }

        tracing::debug!(dim = vector.len(), model = %model_name, "generated face embedding");

        Ok(FaceEmbedding {
            vector,
            model_name,
            embedding_dim: expected_dim,
        })
    }
}

fn decode_image(bytes: &[u8]) -> Result<DynamicImage, EmbedError> {
    image::load_from_memory(bytes).map_err(|e| EmbedError::InvalidImage(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, image::Rgb(rgb));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .expect("encode test png");
        buf.into_inner()
    }

    #[tokio::test]
    async fn embed_returns_vector_of_configured_length() {
        let embedder = Embedder::with_stub_model(EmbedderConfig::default()).unwrap();
        let embedding = embedder.embed(png_bytes(64, 64, [12, 34, 56])).await.unwrap();
        assert_eq!(embedding.vector.len(), 128);
        assert_eq!(embedding.embedding_dim, 128);
        assert_eq!(embedding.model_name, "facenet");
    }

    #[tokio::test]
    async fn embed_is_deterministic_over_identical_bytes() {
        let embedder = Embedder::with_stub_model(EmbedderConfig::default()).unwrap();
        let bytes = png_bytes(64, 64, [12, 34, 56]);
        let a = embedder.embed(bytes.clone()).await.unwrap();
        let b = embedder.embed(bytes).await.unwrap();
        assert_eq!(a.vector, b.vector);
    }

    #[tokio::test]
    async fn embed_rejects_garbage_bytes() {
        let embedder = Embedder::with_stub_model(EmbedderConfig::default()).unwrap();
        let err = embedder
            .embed(b"definitely not an image".to_vec())
            .await
            .expect_err("garbage must not embed");
        assert!(matches!(err, EmbedError::InvalidImage(_)));
    }

    #[tokio::test]
    async fn embed_reports_no_face_for_tiny_image() {
        let embedder = Embedder::with_stub_model(EmbedderConfig::default()).unwrap();
        let err = embedder
            .embed(png_bytes(4, 4, [0, 0, 0]))
            .await
            .expect_err("undersized image has no detectable face");
        assert!(matches!(err, EmbedError::NoFaceDetected));
    }

    #[tokio::test]
    async fn concurrent_embeds_share_the_bounded_pool() {
        let embedder = Arc::new(
            Embedder::with_stub_model(EmbedderConfig {
                workers: 2,
                ..Default::default()
            })
            .unwrap(),
        );

        let mut handles = Vec::new();
        for shade in 0..8u8 {
            let embedder = Arc::clone(&embedder);
            handles.push(tokio::spawn(async move {
                embedder.embed(png_bytes(32, 32, [shade, shade, shade])).await
            }));
        }
        for handle in handles {
            let embedding = handle.await.unwrap().unwrap();
            assert_eq!(embedding.vector.len(), 128);
        }
    }

    #[test]
    fn model_dim_mismatch_rejected_at_construction() {
        let cfg = EmbedderConfig {
            embedding_dim: 128,
            ..Default::default()
        };
        let model = Arc::new(StubFaceModel::new(64));
        let err = Embedder::new(cfg, model).expect_err("dim mismatch must fail");
        assert!(matches!(err, EmbedError::InvalidConfig(_)));
    }
}
