//! Error types for source adapters.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from file, git, and license source adapters.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source path does not exist.
    #[error("source not found: {0}")]
    NotFound(PathBuf),

    /// An include/exclude glob failed to parse.
    #[error("invalid glob pattern '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },

    /// Cloning or inspecting a git repository failed.
    #[error("git error: {0}")]
    Git(String),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
