use fxhash::hash64;
use image::{DynamicImage, GenericImageView};

use crate::error::EmbedError;
use crate::normalize::l2_normalize_in_place;

/// Smallest image edge (in pixels) the stub accepts as plausibly containing
/// a face. Anything below reports `NoFaceDetected`.
pub const MIN_FACE_PX: u32 = 16;

/// Opaque face model boundary: decoded image in, fixed-length vector out.
///
/// Implementations are expected to perform their own face detection and
/// report [`EmbedError::NoFaceDetected`] rather than embedding a faceless
/// crop. Calls are CPU-bound and synchronous; [`Embedder`](crate::Embedder)
/// isolates them on a bounded blocking pool.
pub trait FaceModel: Send + Sync {
    /// Embedding dimensionality this model produces.
    fn dim(&self) -> usize;

    /// Compute the embedding for the (single) face in `image`.
    fn represent(&self, image: &DynamicImage) -> Result<Vec<f32>, EmbedError>;
}

/// Deterministic stand-in used in tests and model-less deployments.
///
/// Derives sinusoid values from a hash of the decoded pixels, so identical
/// bytes always embed identically and distinct images land far apart. The
/// output is L2-normalized, matching what a real recognition model emits.
#[derive(Debug, Clone)]
pub struct StubFaceModel {
    dim: usize,
}

impl StubFaceModel {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl FaceModel for StubFaceModel {
    fn dim(&self) -> usize {
        self.dim
    }

    fn represent(&self, image: &DynamicImage) -> Result<Vec<f32>, EmbedError> {
        let (width, height) = image.dimensions();
        if width < MIN_FACE_PX || height < MIN_FACE_PX {
            return Err(EmbedError::NoFaceDetected);
        }

        let pixels = image.to_rgb8();
        let h = hash64(pixels.as_raw());
        let mut v = vec![0f32; self.dim];
        for (idx, value) in v.iter_mut().enumerate() {
            *value = ((h >> (idx % 32)) as f32 * 0.0001).sin();
        }
        l2_normalize_in_place(&mut v);
        Ok(v)
    }
}
