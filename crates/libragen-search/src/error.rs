//! Error types for hybrid search.

use thiserror::Error;

/// Errors from search orchestration.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The artifact store failed.
    #[error("store error: {0}")]
    Store(#[from] libragen_store::error::StoreError),

    /// Query embedding failed.
    #[error("embedding error: {0}")]
    Embedding(#[source] anyhow::Error),

    /// Reranking failed.
    #[error("rerank error: {0}")]
    Rerank(#[source] anyhow::Error),
}
