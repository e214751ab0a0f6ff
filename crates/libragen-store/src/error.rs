//! Error types for the artifact store.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from artifact store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The artifact file does not exist.
    #[error("artifact not found: {0}")]
    NotFound(PathBuf),

    /// The artifact is missing its manifest or violates a store invariant.
    #[error("invalid artifact: {0}")]
    InvalidArtifact(String),

    /// The artifact was written by a newer engine than this one.
    #[error("artifact requires schema version {required}, this engine supports {supported}")]
    SchemaVersion { required: i64, supported: i64 },

    /// The artifact needs migration but was opened read-only.
    #[error("artifact at schema version {stored} requires migration but was opened read-only")]
    MigrationRequired { stored: i64 },

    /// A migration failed; the pre-migration backup has been restored.
    #[error("migration {version} failed: {message}")]
    Migration { version: i64, message: String },

    /// The migration list has a gap or is not strictly ascending.
    #[error("migration versions must be contiguous and ascending, found {found} after {previous}")]
    MigrationGap { previous: i64, found: i64 },

    /// The store handle has been closed.
    #[error("store is closed")]
    Closed,

    /// The store was opened read-only and a write was attempted.
    #[error("store is read-only")]
    ReadOnly,

    /// An embedding's length does not match the configured dimensionality.
    #[error("embedding has {got} dimensions, store is configured for {expected}")]
    Dimensions { expected: usize, got: usize },

    /// `add_chunks` was called with mismatched slice lengths.
    #[error("chunk/embedding count mismatch: {chunks} chunks, {embeddings} embeddings")]
    LengthMismatch { chunks: usize, embeddings: usize },

    /// Underlying engine error.
    #[error("database error: {0}")]
    Sql(#[from] libsql::Error),

    /// Filesystem error on the artifact or its backup.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest (de)serialization failed.
    #[error("manifest serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
