//! Collaborator traits for embedding and reranking.
//!
//! The core never loads model weights itself. It consumes an [`Embedder`]
//! that turns text into fixed-dimension unit vectors and an optional
//! [`Reranker`] that scores (query, document) pairs. Implementations may
//! load their models lazily on first use.

/// Produces fixed-dimension unit-normalized embeddings.
///
/// `embed` takes `&mut self` because ONNX-backed engines mutate internal
/// state and load their model on first call.
pub trait Embedder: Send {
    /// Model identifier recorded in artifact manifests.
    fn model(&self) -> &str;

    /// Output dimensionality. Every returned vector has exactly this many
    /// components.
    fn dimensions(&self) -> usize;

    /// Embed a batch of texts, one unit vector per input, in input order.
    fn embed(
        &mut self,
        texts: &[String],
    ) -> impl Future<Output = anyhow::Result<Vec<Vec<f32>>>> + Send;
}

/// Scores (query, document) pairs; higher is more relevant.
pub trait Reranker: Send {
    /// Score each document against the query, in document order.
    fn rerank(
        &mut self,
        query: &str,
        documents: &[String],
    ) -> impl Future<Output = anyhow::Result<Vec<f32>>> + Send;
}

/// Placeholder reranker for callers that do not rerank.
///
/// Requesting rerank with this configured behaves like rerank=false: it is
/// never invoked, and if it were it would return the neutral score for every
/// document.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReranker;

impl Reranker for NoReranker {
    async fn rerank(&mut self, _query: &str, documents: &[String]) -> anyhow::Result<Vec<f32>> {
        Ok(vec![0.0; documents.len()])
    }
}

/// Scale a vector to unit L2 norm in place. Zero vectors are left unchanged.
pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_produces_unit_norm() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_leaves_zero_vector() {
        let mut v = vec![0.0, 0.0, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn no_reranker_scores_neutral() {
        let mut r = NoReranker;
        let scores = r
            .rerank("q", &["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(scores, vec![0.0, 0.0]);
    }
}
