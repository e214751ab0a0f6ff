//! Library handle: an open artifact plus its parsed manifest.
//!
//! A [`Library`] owns its [`ArtifactStore`] for its whole lifetime;
//! collections never own libraries, they only hold names.

use std::path::Path;

use libragen_core::LibraryManifest;

use crate::ArtifactStore;
use crate::error::StoreError;

/// An open library artifact.
#[derive(Debug)]
pub struct Library {
    store: ArtifactStore,
    manifest: LibraryManifest,
}

impl Library {
    /// Open a finalized artifact writable.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for a missing file,
    /// [`StoreError::InvalidArtifact`] when the manifest is missing or
    /// malformed, plus any migration error.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = ArtifactStore::open(path.as_ref()).await?;
        Self::wrap(store).await
    }

    /// Open a finalized artifact read-only.
    ///
    /// # Errors
    ///
    /// As [`Library::open`], plus [`StoreError::MigrationRequired`] when the
    /// artifact is behind the current schema.
    pub async fn open_read_only(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = ArtifactStore::open_read_only(path.as_ref()).await?;
        Self::wrap(store).await
    }

    async fn wrap(store: ArtifactStore) -> Result<Self, StoreError> {
        let manifest = store
            .get_metadata::<LibraryManifest>()
            .await?
            .ok_or_else(|| StoreError::InvalidArtifact("manifest is missing".to_string()))?;
        Ok(Self { store, manifest })
    }

    /// The embedded manifest.
    #[must_use]
    pub const fn manifest(&self) -> &LibraryManifest {
        &self.manifest
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Release the underlying handle. Idempotent.
    pub fn close(&mut self) {
        self.store.close();
    }
}
