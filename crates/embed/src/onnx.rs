//! ONNX face model backed by `ort`.
//!
//! Loads a face recognition graph (FaceNet-style, 128-d output) from disk
//! and runs it on a square-padded, standardized RGB tensor. Face detection
//! is expected to be part of the exported graph; graphs that embed whatever
//! crop they are given should be paired with an upstream detector.

use std::path::Path;
use std::sync::Mutex;

use image::DynamicImage;
use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;

use crate::error::EmbedError;
use crate::model::FaceModel;
use crate::normalize::l2_normalize_in_place;

/// Input edge length expected by the recognition graph.
const INPUT_SIZE: u32 = 160;

pub struct OnnxFaceModel {
    // ort sessions take &mut self to run; the embedder already serializes
    // calls through its worker pool, so a Mutex here is uncontended.
    session: Mutex<Session>,
    dim: usize,
}

impl OnnxFaceModel {
    /// Load the recognition model from `path`.
    pub fn from_file(path: &Path, dim: usize) -> Result<Self, EmbedError> {
        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| EmbedError::Inference(format!("load model {}: {e}", path.display())))?;
        Ok(Self {
            session: Mutex::new(session),
            dim,
        })
    }

    /// Standardize to the FaceNet input distribution: (p - 127.5) / 128.
    fn to_input_tensor(image: &DynamicImage) -> Result<Array4<f32>, EmbedError> {
        let resized = image.resize_exact(
            INPUT_SIZE,
            INPUT_SIZE,
            image::imageops::FilterType::Triangle,
        );
        let rgb = resized.to_rgb8();
        let size = INPUT_SIZE as usize;

        let mut data = vec![0f32; 3 * size * size];
        let (r_channel, rest) = data.split_at_mut(size * size);
        let (g_channel, b_channel) = rest.split_at_mut(size * size);
        for (i, pixel) in rgb.pixels().enumerate() {
            r_channel[i] = (pixel[0] as f32 - 127.5) / 128.0;
            g_channel[i] = (pixel[1] as f32 - 127.5) / 128.0;
            b_channel[i] = (pixel[2] as f32 - 127.5) / 128.0;
        }

        Array4::from_shape_vec((1, 3, size, size), data)
            .map_err(|e| EmbedError::Inference(format!("input tensor shape: {e}")))
    }
}

impl FaceModel for OnnxFaceModel {
    fn dim(&self) -> usize {
        self.dim
    }

    fn represent(&self, image: &DynamicImage) -> Result<Vec<f32>, EmbedError> {
        let input = Self::to_input_tensor(image)?;
        let tensor = Value::from_array(input)
            .map_err(|e| EmbedError::Inference(format!("input tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| EmbedError::Inference(format!("inference: {e}")))?;

        let (_name, output) = outputs
            .iter()
            .next()
            .ok_or_else(|| EmbedError::Inference("model produced no outputs".into()))?;
        let (_shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| EmbedError::Inference(format!("extract output: {e}")))?;

        if data.is_empty() {
            return Err(EmbedError::NoFaceDetected);
        }

        // First row of the output batch is the embedding for our single face.
        let mut vector: Vec<f32> = data.iter().take(self.dim).copied().collect();
        l2_normalize_in_place(&mut vector);
        Ok(vector)
    }
}
