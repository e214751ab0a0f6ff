//! Embedding BLOB packing and similarity.
//!
//! Embeddings are stored as little-endian packed `f32` values. The packed
//! length is always `4 * dimensions` bytes; anything else fails decoding.

use crate::error::StoreError;

/// Pack an embedding into a little-endian byte blob.
#[must_use]
pub fn pack_embedding(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Unpack a little-endian byte blob into an embedding.
///
/// # Errors
///
/// Returns [`StoreError::InvalidArtifact`] when the blob length is not a
/// multiple of four.
pub fn unpack_embedding(bytes: &[u8]) -> Result<Vec<f32>, StoreError> {
    if bytes.len() % 4 != 0 {
        return Err(StoreError::InvalidArtifact(format!(
            "embedding blob length {} is not a multiple of 4",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Cosine similarity `dot / (‖a‖·‖b‖)`. Zero-magnitude vectors score 0.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
