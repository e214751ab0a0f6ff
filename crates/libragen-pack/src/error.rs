//! Error types for the package manager.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from install, uninstall, and collection operations.
#[derive(Debug, Error)]
pub enum PackError {
    /// A library, collection, or path could not be found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Install without `force` into an occupied slot.
    #[error("library '{name}' is already installed at {path}")]
    AlreadyInstalled { name: String, path: PathBuf },

    /// A collection document is malformed or self-inconsistent.
    #[error("invalid collection: {0}")]
    InvalidCollection(String),

    /// Collection nesting exceeded the resolution depth limit.
    #[error("collection nesting exceeds the maximum depth of {max}")]
    DepthExceeded { max: usize },

    /// The server answered with a non-success status.
    #[error("download of {url} failed with status {status}")]
    Download { status: u16, url: String },

    /// Transport-level HTTP failure.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Downloaded bytes do not match the expected SHA-256.
    #[error("integrity check failed: expected sha256 {expected}, got {actual}")]
    Integrity { expected: String, actual: String },

    /// The manager has no install location configured.
    #[error("no library directory configured")]
    NoInstallLocation,

    /// Artifact validation or store failure.
    #[error("store error: {0}")]
    Store(#[from] libragen_store::error::StoreError),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest or collection (de)serialization failure.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
