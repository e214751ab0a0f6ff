//! Deterministic embedding stubs for tests.
//!
//! Real models are hundreds of megabytes and nondeterministic across
//! versions, so tests across the workspace use these hash-based stand-ins.
//! [`HashEmbedder`] maps each whitespace token to a bucket of a fixed-size
//! vector, which makes lexical overlap translate into cosine similarity:
//! enough structure for ranking assertions without any model download.

use crate::embedder::{Embedder, Reranker, l2_normalize};

/// FNV-1a, used to bucket tokens stably across platforms.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Bag-of-words hashing embedder. Deterministic, no I/O.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    /// Embedder with the given output dimensionality.
    #[must_use]
    pub const fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Embed a single text synchronously (handy in non-async tests).
    #[must_use]
    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimensions];
        for token in text.split_whitespace() {
            let token = token.to_lowercase();
            let h = fnv1a(token.as_bytes());
            #[allow(clippy::cast_possible_truncation)]
            let bucket = (h % self.dimensions as u64) as usize;
            let sign = if h & (1 << 63) == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }
        l2_normalize(&mut v);
        v
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Embedder for HashEmbedder {
    fn model(&self) -> &str {
        "test/hash-embedder"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&mut self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

/// Token-overlap reranker: score = number of query tokens present in the
/// document. Deterministic and order-preserving for equal scores.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapReranker;

impl Reranker for OverlapReranker {
    async fn rerank(&mut self, query: &str, documents: &[String]) -> anyhow::Result<Vec<f32>> {
        let terms: Vec<String> = query
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        Ok(documents
            .iter()
            .map(|doc| {
                let doc = doc.to_lowercase();
                #[allow(clippy::cast_precision_loss)]
                let score = terms.iter().filter(|t| doc.contains(*t)).count() as f32;
                score
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeddings_are_deterministic() {
        let e = HashEmbedder::new(32);
        assert_eq!(e.embed_one("hello world"), e.embed_one("hello world"));
    }

    #[test]
    fn embeddings_are_unit_vectors() {
        let e = HashEmbedder::new(32);
        let v = e.embed_one("tokio spawn async task");
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn lexical_overlap_raises_similarity() {
        let e = HashEmbedder::new(64);
        let a = e.embed_one("spawn a new async task");
        let b = e.embed_one("spawn an async task now");
        let c = e.embed_one("chocolate cake recipe");
        let dot = |x: &[f32], y: &[f32]| -> f32 { x.iter().zip(y).map(|(p, q)| p * q).sum() };
        assert!(dot(&a, &b) > dot(&a, &c));
    }

    #[test]
    fn empty_text_embeds_to_zero() {
        let e = HashEmbedder::new(16);
        assert_eq!(e.embed_one(""), vec![0.0; 16]);
    }

    #[tokio::test]
    async fn overlap_reranker_counts_terms() {
        let mut r = OverlapReranker;
        let scores = r
            .rerank(
                "async task",
                &[
                    "spawning an async task".to_string(),
                    "a task queue".to_string(),
                    "chocolate cake".to_string(),
                ],
            )
            .await
            .unwrap();
        assert_eq!(scores, vec![2.0, 1.0, 0.0]);
    }
}
