//! Libragen home directory layout.
//!
//! Everything persistent lives under one base directory:
//!
//! ```text
//! $LIBRAGEN_HOME/
//!   libraries/        installed .libragen artifacts (global location)
//!   manifest.json     persistent install record
//!   collections.json  collection index configuration
//!   cache/            scratch downloads
//!   models/           embedder/reranker model cache
//! ```
//!
//! The base defaults to the platform data directory
//! (`~/Library/Application Support/libragen` on macOS, `%APPDATA%\libragen`
//! on Windows, `$XDG_DATA_HOME/libragen` else `~/.local/share/libragen` on
//! Linux) and is overridden by `LIBRAGEN_HOME`. The model cache is
//! separately overridden by `LIBRAGEN_MODEL_CACHE`.

use std::path::{Path, PathBuf};

/// Environment variable overriding the base directory.
pub const HOME_ENV: &str = "LIBRAGEN_HOME";

/// Environment variable overriding the model cache directory.
pub const MODEL_CACHE_ENV: &str = "LIBRAGEN_MODEL_CACHE";

/// File extension of library artifacts (without the leading dot).
pub const LIBRARY_EXTENSION: &str = "libragen";

/// File extension of packed collection archives (without the leading dot).
pub const COLLECTION_EXTENSION: &str = "libragen-collection";

/// Resolved libragen home directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibragenHome {
    root: PathBuf,
}

impl LibragenHome {
    /// Resolve the home directory from `LIBRAGEN_HOME` or the platform
    /// data directory. Falls back to `.libragen` in the current directory
    /// when neither is available.
    #[must_use]
    pub fn resolve() -> Self {
        let root = std::env::var_os(HOME_ENV).map_or_else(
            || {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("libragen")
            },
            PathBuf::from,
        );
        Self { root }
    }

    /// Home rooted at an explicit directory (tests, embedded use).
    #[must_use]
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Base directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Global library installation directory.
    #[must_use]
    pub fn libraries_dir(&self) -> PathBuf {
        self.root.join("libraries")
    }

    /// Persistent install manifest path.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join("manifest.json")
    }

    /// Collections index configuration path.
    #[must_use]
    pub fn collections_path(&self) -> PathBuf {
        self.root.join("collections.json")
    }

    /// Scratch cache directory for downloads.
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    /// Model cache directory, honoring `LIBRAGEN_MODEL_CACHE`.
    #[must_use]
    pub fn models_dir(&self) -> PathBuf {
        std::env::var_os(MODEL_CACHE_ENV)
            .map_or_else(|| self.root.join("models"), PathBuf::from)
    }
}

/// True when `path` names a library artifact by extension.
#[must_use]
pub fn is_library_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == LIBRARY_EXTENSION)
}

/// True when `path` names a packed collection archive.
///
/// The extension contains a dash, which `Path::extension` does not treat
/// specially, so a plain suffix check on the file name is used.
#[must_use]
pub fn is_collection_archive_path(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(&format!(".{COLLECTION_EXTENSION}")))
}
