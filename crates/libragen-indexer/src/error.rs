//! Error types for the indexer.

use thiserror::Error;

/// Errors from building an artifact.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The source produced no chunks at all.
    #[error("no indexable content found in the source")]
    EmptyIndex,

    /// The build was cancelled via its cancellation token.
    #[error("build cancelled")]
    Cancelled,

    /// Name/version or other options are unusable.
    #[error("invalid build options: {0}")]
    InvalidOptions(String),

    /// Source adapter failure (missing path, clone failure, bad globs).
    #[error("source error: {0}")]
    Source(#[from] libragen_sources::SourceError),

    /// Artifact store failure.
    #[error("store error: {0}")]
    Store(#[from] libragen_store::error::StoreError),

    /// Embedding a chunk batch failed; the build aborts.
    #[error("embedding error: {0}")]
    Embedding(#[source] anyhow::Error),

    /// Filesystem failure outside the store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
