use std::io;
use thiserror::Error;

/// Errors surfaced by the embedding stage.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// The model found no face in the supplied image.
    #[error("no face detected in image")]
    NoFaceDetected,
    /// The bytes could not be decoded as a supported image format.
    #[error("invalid image: {0}")]
    InvalidImage(String),
    /// The model produced a vector whose length does not match the
    /// configured dimensionality.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    Dimension { expected: usize, actual: usize },
    /// Model-side failure (session setup, inference, missing model file).
    #[error("embedding failure: {0}")]
    Inference(String),
    /// Configuration is inconsistent (e.g. zero workers or dimensionality).
    #[error("invalid embedder config: {0}")]
    InvalidConfig(String),
    /// Low-level IO failures while touching the filesystem.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_error_names_both_lengths() {
        let err = EmbedError::Dimension {
            expected: 128,
            actual: 512,
        };
        let msg = err.to_string();
        assert!(msg.contains("128"));
        assert!(msg.contains("512"));
    }

    #[test]
    fn invalid_image_carries_reason() {
        let err = EmbedError::InvalidImage("not a png".into());
        assert!(err.to_string().contains("not a png"));
    }
}
