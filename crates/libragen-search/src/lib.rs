//! # libragen-search
//!
//! Hybrid search over one open artifact.
//!
//! The searcher embeds the query, picks a strategy from `hybrid_alpha`
//! (exactly 0 = keyword only, exactly 1 = vector only, anything between =
//! store-side RRF), deduplicates candidates by `(source_file, start_line)`,
//! optionally reranks with a cross-encoder, and optionally attaches
//! adjacent chunks as context. It never mutates the store.

pub mod error;

use libragen_core::embedder::{Embedder, NoReranker, Reranker};
use libragen_core::StoredChunk;
use libragen_store::{ArtifactStore, ScoredChunk, SearchFilter};
use serde::{Deserialize, Serialize};

pub use error::SearchError;

/// Default result count.
pub const DEFAULT_K: usize = 10;

/// Default vector/keyword blend.
pub const DEFAULT_HYBRID_ALPHA: f32 = 0.5;

/// Options for one search call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    /// Query text; blank (after trim) short-circuits to an empty result.
    pub query: String,
    /// Number of results to return.
    pub k: usize,
    /// Strategy selector in `[0, 1]`: 0 keyword-only, 1 vector-only,
    /// otherwise hybrid RRF.
    pub hybrid_alpha: f32,
    /// Rerank with the configured cross-encoder. Without one configured
    /// this is equivalent to `false`.
    pub rerank: bool,
    /// Restrict matches to this content version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_version: Option<String>,
    /// Attach up to this many preceding chunks per result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_before: Option<usize>,
    /// Attach up to this many following chunks per result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_after: Option<usize>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            query: String::new(),
            k: DEFAULT_K,
            hybrid_alpha: DEFAULT_HYBRID_ALPHA,
            rerank: false,
            content_version: None,
            context_before: None,
            context_after: None,
        }
    }
}

impl SearchOptions {
    /// Options for `query` with every other field at its default.
    #[must_use]
    pub fn query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

/// One search hit with optional surrounding context.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub chunk: StoredChunk,
    /// Strategy score (cosine, negated BM25, RRF, or rerank score).
    pub score: f32,
    /// Preceding chunks in ascending line order.
    pub context_before: Vec<StoredChunk>,
    /// Following chunks in ascending line order.
    pub context_after: Vec<StoredChunk>,
}

/// Searcher owning an embedder and an optional reranker.
///
/// One searcher serves many artifacts; pass the store per call.
#[derive(Debug)]
pub struct LibrarySearcher<E, R = NoReranker> {
    embedder: E,
    reranker: Option<R>,
}

impl<E: Embedder> LibrarySearcher<E> {
    /// Searcher without a reranker; `rerank: true` requests degrade to
    /// plain ranking.
    #[must_use]
    pub const fn new(embedder: E) -> Self {
        Self {
            embedder,
            reranker: None,
        }
    }
}

impl<E: Embedder, R: Reranker> LibrarySearcher<E, R> {
    /// Searcher with a reranker.
    #[must_use]
    pub const fn with_reranker(embedder: E, reranker: R) -> Self {
        Self {
            embedder,
            reranker: Some(reranker),
        }
    }

    /// Run one search against `store`.
    ///
    /// # Errors
    ///
    /// Propagates store failures and embedding/rerank failures.
    pub async fn search(
        &mut self,
        store: &ArtifactStore,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let query = options.query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let k = options.k.max(1);
        let alpha = options.hybrid_alpha.clamp(0.0, 1.0);
        let rerank_active = options.rerank && self.reranker.is_some();
        let fetch_count = k * if rerank_active { 5 } else { 2 };
        let dedup_cap = if rerank_active { k * 3 } else { k };
        let filter = SearchFilter {
            content_version: options.content_version.clone(),
        };
        tracing::debug!(k, alpha, rerank_active, fetch_count, "running search");

        let candidates = if alpha <= 0.0 {
            // Keyword-only: the embedding would be discarded, skip it.
            store.keyword_search(query, fetch_count, &filter).await?
        } else {
            let query_vec = self.embed_query(query).await?;
            if alpha >= 1.0 {
                store.vector_search(&query_vec, fetch_count, &filter).await?
            } else {
                store
                    .hybrid_search(&query_vec, query, fetch_count, &filter)
                    .await?
            }
        };

        let mut survivors = dedup_candidates(candidates, dedup_cap);

        if options.rerank && let Some(reranker) = self.reranker.as_mut() {
            let documents: Vec<String> =
                survivors.iter().map(|s| s.chunk.content.clone()).collect();
            let scores = reranker
                .rerank(query, &documents)
                .await
                .map_err(SearchError::Rerank)?;
            for (survivor, score) in survivors.iter_mut().zip(scores) {
                survivor.score = score;
            }
            survivors.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            survivors.truncate(k);
        }

        let attach_context =
            options.context_before.unwrap_or(0) > 0 || options.context_after.unwrap_or(0) > 0;

        let mut results = Vec::with_capacity(survivors.len());
        for survivor in survivors {
            let (context_before, context_after) = if attach_context {
                let adjacent = store
                    .get_adjacent_chunks(
                        survivor.chunk.id,
                        options.context_before.unwrap_or(0),
                        options.context_after.unwrap_or(0),
                    )
                    .await?;
                (adjacent.before, adjacent.after)
            } else {
                (Vec::new(), Vec::new())
            };
            results.push(SearchResult {
                chunk: survivor.chunk,
                score: survivor.score,
                context_before,
                context_after,
            });
        }
        Ok(results)
    }

    async fn embed_query(&mut self, query: &str) -> Result<Vec<f32>, SearchError> {
        let mut vectors = self
            .embedder
            .embed(std::slice::from_ref(&query.to_string()))
            .await
            .map_err(SearchError::Embedding)?;
        Ok(vectors.pop().unwrap_or_default())
    }
}

/// Drop duplicate `(source_file, start_line ?? "unknown")` keys, keeping
/// the first occurrence, capped at `cap` survivors.
fn dedup_candidates(candidates: Vec<ScoredChunk>, cap: usize) -> Vec<ScoredChunk> {
    use std::collections::HashSet;

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut survivors = Vec::new();
    for candidate in candidates {
        let line_key = candidate
            .chunk
            .start_line
            .map_or_else(|| "unknown".to_string(), |l| l.to_string());
        let key = (candidate.chunk.source_file.clone(), line_key);
        if seen.insert(key) {
            survivors.push(candidate);
            if survivors.len() == cap {
                break;
            }
        }
    }
    survivors
}
