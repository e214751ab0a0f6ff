//! Persistent installation manifest.
//!
//! One JSON document under the libragen home directory records every
//! installed library and collection. Libraries are reference-counted: the
//! reference set is `installedBy ∪ {manual}`, and a library's file is
//! deleted from disk exactly when that set becomes empty. Writes are
//! whole-file rewrites via write-to-temp-then-rename so a crash never
//! leaves a torn manifest.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PackError;

/// Manifest format identifier.
pub const MANIFEST_FORMAT_VERSION: &str = "1.0.0";

/// One installed library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledLibraryRecord {
    pub name: String,
    /// Origin URI the artifact was installed from.
    pub source: String,
    /// Collections that installed this library.
    #[serde(default)]
    pub installed_by: Vec<String>,
    /// Whether the user installed it directly.
    pub manual: bool,
    pub installed_at: DateTime<Utc>,
}

impl InstalledLibraryRecord {
    /// The reference set is empty when no collection claims the library and
    /// it was not manually installed.
    #[must_use]
    pub fn is_unreferenced(&self) -> bool {
        self.installed_by.is_empty() && !self.manual
    }
}

/// One installed collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledCollection {
    pub name: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Libraries this collection installs.
    #[serde(default)]
    pub libraries: Vec<String>,
    /// Nested collection names.
    #[serde(default)]
    pub collections: Vec<String>,
    pub installed_at: DateTime<Utc>,
}

/// The persistent manifest document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallManifest {
    pub version: String,
    #[serde(default)]
    pub collections: BTreeMap<String, InstalledCollection>,
    #[serde(default)]
    pub libraries: BTreeMap<String, InstalledLibraryRecord>,
}

impl Default for InstallManifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_FORMAT_VERSION.to_string(),
            collections: BTreeMap::new(),
            libraries: BTreeMap::new(),
        }
    }
}

impl InstallManifest {
    /// Load from `path`; a missing file is an empty manifest.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Json`] for a corrupt file and [`PackError::Io`]
    /// for unreadable ones.
    pub async fn load(path: &Path) -> Result<Self, PackError> {
        match tokio::fs::read_to_string(path).await {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Atomically rewrite the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Io`] on filesystem failure.
    pub async fn save(&self, path: &Path) -> Result<(), PackError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(self)?;
        let mut temp = path.as_os_str().to_os_string();
        temp.push(".tmp");
        let temp = std::path::PathBuf::from(temp);
        tokio::fs::write(&temp, json).await?;
        tokio::fs::rename(&temp, path).await?;
        Ok(())
    }

    /// Record a library install. Repeated installs merge: the collection
    /// reference is added (deduplicated) and the manual flag is OR-ed, so a
    /// manual library later pulled in by a collection stays manual.
    pub fn add_library(&mut self, name: &str, source: &str, collection: Option<&str>) {
        if let Some(record) = self.libraries.get_mut(name) {
            if let Some(collection) = collection {
                if !record.installed_by.iter().any(|c| c == collection) {
                    record.installed_by.push(collection.to_string());
                }
            } else {
                record.manual = true;
            }
            return;
        }
        self.libraries.insert(
            name.to_string(),
            InstalledLibraryRecord {
                name: name.to_string(),
                source: source.to_string(),
                installed_by: collection.map(str::to_string).into_iter().collect(),
                manual: collection.is_none(),
                installed_at: Utc::now(),
            },
        );
    }

    /// Record a collection install, replacing any previous record.
    pub fn add_collection(&mut self, record: InstalledCollection) {
        self.collections.insert(record.name.clone(), record);
    }

    /// Remove one reference from a library record.
    ///
    /// With a collection name, that collection's reference is dropped; with
    /// none (manual uninstall), the manual flag is cleared. The record is
    /// dropped and `true` returned iff the reference set is empty
    /// afterwards; `true` means the caller should delete the file. A
    /// missing record counts as unreferenced.
    pub fn remove_library(&mut self, name: &str, collection: Option<&str>) -> bool {
        let Some(record) = self.libraries.get_mut(name) else {
            return true;
        };
        match collection {
            Some(collection) => record.installed_by.retain(|c| c != collection),
            None => record.manual = false,
        }
        if record.is_unreferenced() {
            self.libraries.remove(name);
            true
        } else {
            false
        }
    }

    /// Remove a collection and release its library references.
    ///
    /// Returns the names of libraries whose reference set became empty (and
    /// whose records were dropped), or `None` when the collection is not
    /// installed.
    pub fn remove_collection(&mut self, name: &str) -> Option<Vec<String>> {
        let collection = self.collections.remove(name)?;
        let mut released = Vec::new();
        for library in &collection.libraries {
            if let Some(record) = self.libraries.get_mut(library) {
                record.installed_by.retain(|c| c != name);
                if record.is_unreferenced() {
                    self.libraries.remove(library);
                    released.push(library.clone());
                }
            }
        }
        Some(released)
    }
}
