//! Error types for embedding generation.

use thiserror::Error;

/// Errors from local embedding and reranking.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The requested model id is not in the supported set.
    #[error("unsupported embedding model: {0}")]
    UnsupportedModel(String),

    /// Model download or ONNX initialization failed.
    #[error("model initialization failed: {0}")]
    Init(String),

    /// Inference failed.
    #[error("inference failed: {0}")]
    Inference(String),
}
