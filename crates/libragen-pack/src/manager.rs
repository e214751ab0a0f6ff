//! Library manager: multi-location discovery, install/uninstall, and
//! reference-counted collection lifecycle.
//!
//! Libraries live as `*.libragen` files in an ordered list of directories:
//! by default the project-local `.libragen/libraries` (when present)
//! followed by the global directory under the libragen home. Installs land
//! in the first directory; discovery scans all of them with
//! first-match-by-name semantics. The persistent manifest records who
//! installed what; a library's file is deleted exactly when its reference
//! set empties.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use libragen_core::home::{LIBRARY_EXTENSION, LibragenHome, is_collection_archive_path};
use libragen_core::LibraryManifest;
use libragen_store::Library;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::archive::{ARCHIVE_COLLECTION_FILE, unpack_collection};
use crate::error::PackError;
use crate::fetch::{fetch_bytes, verify_sha256};
use crate::manifest::{InstallManifest, InstalledCollection};
use crate::resolver::{ResolveOptions, ResolvedLibrary, resolve};

/// Serializes manifest read-modify-write cycles across every manager in
/// the process.
static MANIFEST_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Where an installed library was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryLocation {
    Global,
    Project,
}

/// A discovered installed library.
#[derive(Debug, Clone, PartialEq)]
pub struct InstalledLibrary {
    /// Name from the embedded manifest (not the filename).
    pub name: String,
    pub version: String,
    pub content_version: Option<String>,
    pub description: Option<String>,
    /// Artifact file path.
    pub path: PathBuf,
    pub location: LibraryLocation,
    /// The full embedded manifest.
    pub metadata: LibraryManifest,
}

/// Configuration for a [`LibraryManager`].
#[derive(Debug, Clone, Default)]
pub struct ManagerOptions {
    /// Explicit library directories; replaces the default ordering
    /// entirely when set.
    pub paths: Option<Vec<PathBuf>>,
    /// Home override (tests, embedded use); defaults to
    /// [`LibragenHome::resolve`].
    pub home: Option<LibragenHome>,
    /// Project directory probed for `.libragen/libraries`; defaults to the
    /// current working directory.
    pub project_dir: Option<PathBuf>,
}

/// Options for [`LibraryManager::install`].
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Overwrite an occupied slot.
    pub force: bool,
    /// Collection claiming this install; absent means manual.
    pub collection_name: Option<String>,
    /// Origin URI recorded in the manifest when the artifact was staged to
    /// a temporary path first; defaults to the source path.
    pub source_uri: Option<String>,
}

/// Options for [`LibraryManager::install_collection`].
#[derive(Debug, Clone, Default)]
pub struct CollectionInstallOptions {
    /// Also install libraries marked optional.
    pub include_optional: bool,
    /// Overwrite occupied slots.
    pub force: bool,
}

/// Per-library outcome summary of a collection install.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionInstallReport {
    /// Libraries newly installed.
    pub installed: Vec<String>,
    /// Libraries already present (and not forced).
    pub skipped: Vec<String>,
    /// Libraries that failed, with the failure message.
    pub failed: Vec<(String, String)>,
}

/// The package manager.
#[derive(Debug, Clone)]
pub struct LibraryManager {
    paths: Vec<PathBuf>,
    global_dir: PathBuf,
    manifest_path: PathBuf,
}

impl LibraryManager {
    /// Build a manager from options; see [`ManagerOptions`].
    #[must_use]
    pub fn new(options: ManagerOptions) -> Self {
        let home = options.home.unwrap_or_else(LibragenHome::resolve);
        let global_dir = home.libraries_dir();
        let paths = options.paths.unwrap_or_else(|| {
            let project_dir = options
                .project_dir
                .or_else(|| std::env::current_dir().ok())
                .unwrap_or_else(|| PathBuf::from("."));
            let project_libraries = project_dir.join(".libragen").join("libraries");
            let mut paths = Vec::new();
            if project_libraries.is_dir() {
                paths.push(project_libraries);
            }
            paths.push(global_dir.clone());
            paths
        });
        Self {
            paths,
            global_dir,
            manifest_path: home.manifest_path(),
        }
    }

    /// The configured directory ordering.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn location_of(&self, dir: &Path) -> LibraryLocation {
        if dir == self.global_dir {
            LibraryLocation::Global
        } else {
            LibraryLocation::Project
        }
    }

    fn primary_dir(&self) -> Result<&PathBuf, PackError> {
        self.paths.first().ok_or(PackError::NoInstallLocation)
    }

    /// Discover installed libraries across every configured directory.
    ///
    /// The first directory to contribute a name wins; results are ordered
    /// by name. Unreadable artifacts are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Io`] only for directory enumeration failures on
    /// existing directories.
    pub async fn list(&self) -> Result<Vec<InstalledLibrary>, PackError> {
        let mut found: Vec<InstalledLibrary> = Vec::new();
        for dir in &self.paths {
            if !dir.is_dir() {
                continue;
            }
            let mut artifact_paths = Vec::new();
            let mut entries = tokio::fs::read_dir(dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) == Some(LIBRARY_EXTENSION) {
                    artifact_paths.push(path);
                }
            }
            artifact_paths.sort();

            for path in artifact_paths {
                let mut library = match Library::open_read_only(&path).await {
                    Ok(library) => library,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "unreadable artifact skipped");
                        continue;
                    }
                };
                let manifest = library.manifest().clone();
                library.close();
                if found.iter().any(|l| l.name == manifest.name) {
                    continue;
                }
                found.push(InstalledLibrary {
                    name: manifest.name.clone(),
                    version: manifest.version.clone(),
                    content_version: manifest.content_version.clone(),
                    description: manifest.description.clone(),
                    path,
                    location: self.location_of(dir),
                    metadata: manifest,
                });
            }
        }
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    /// Find the artifact file for `name`: `name.libragen` or
    /// `name-<anything>.libragen`, first directory wins, and within one
    /// directory the lexicographically last filename wins (biasing toward
    /// versioned filenames over legacy unversioned ones).
    pub async fn find_file(&self, name: &str) -> Option<PathBuf> {
        let exact = format!("{name}.{LIBRARY_EXTENSION}");
        let prefix = format!("{name}-");
        for dir in &self.paths {
            let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
                continue;
            };
            let mut matches: Vec<String> = Vec::new();
            while let Ok(Some(entry)) = entries.next_entry().await {
                let filename = entry.file_name().to_string_lossy().into_owned();
                let is_artifact = std::path::Path::new(&filename)
                    .extension()
                    .and_then(|e| e.to_str())
                    == Some(LIBRARY_EXTENSION);
                if is_artifact && (filename == exact || filename.starts_with(&prefix)) {
                    matches.push(filename);
                }
            }
            // Compare stems so `name-1.2.0` sorts after a legacy bare
            // `name`, biasing toward versioned filenames.
            if let Some(last) = matches.into_iter().max_by(|a, b| {
                let stem = |f: &str| f.trim_end_matches(&format!(".{LIBRARY_EXTENSION}")).to_string();
                stem(a).cmp(&stem(b))
            }) {
                return Some(dir.join(last));
            }
        }
        None
    }

    /// Install the artifact at `source_path` into the primary directory.
    ///
    /// # Errors
    ///
    /// [`PackError::AlreadyInstalled`] when the slot is occupied and
    /// `force` is not set; [`PackError::Store`] when the source is not a
    /// valid artifact.
    pub async fn install(
        &self,
        source_path: &Path,
        options: &InstallOptions,
    ) -> Result<InstalledLibrary, PackError> {
        // Validate the source and read its identity, then release it.
        let mut library = Library::open_read_only(source_path).await?;
        let manifest = library.manifest().clone();
        library.close();

        let filename = if manifest.version.is_empty() {
            format!("{}.{LIBRARY_EXTENSION}", manifest.name)
        } else {
            format!("{}-{}.{LIBRARY_EXTENSION}", manifest.name, manifest.version)
        };
        let dir = self.primary_dir()?.clone();
        let destination = dir.join(&filename);

        if destination.exists() && !options.force {
            return Err(PackError::AlreadyInstalled {
                name: manifest.name,
                path: destination,
            });
        }
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::copy(source_path, &destination).await?;
        tracing::info!(name = %manifest.name, path = %destination.display(), "installed library");

        let source_uri = options
            .source_uri
            .clone()
            .unwrap_or_else(|| source_path.to_string_lossy().into_owned());
        self.record_library(&manifest.name, &source_uri, options.collection_name.as_deref())
            .await?;

        Ok(InstalledLibrary {
            name: manifest.name.clone(),
            version: manifest.version.clone(),
            content_version: manifest.content_version.clone(),
            description: manifest.description.clone(),
            path: destination,
            location: self.location_of(&dir),
            metadata: manifest,
        })
    }

    async fn record_library(
        &self,
        name: &str,
        source: &str,
        collection: Option<&str>,
    ) -> Result<(), PackError> {
        let _guard = MANIFEST_LOCK.lock().await;
        let mut manifest = InstallManifest::load(&self.manifest_path).await?;
        manifest.add_library(name, source, collection);
        manifest.save(&self.manifest_path).await
    }

    /// Manually uninstall `name`.
    ///
    /// Returns `false` when the library stays on disk because collections
    /// still reference it, `true` when the file was (or had already been)
    /// removed.
    ///
    /// # Errors
    ///
    /// [`PackError::NotFound`] when neither a record nor a file exists.
    pub async fn uninstall(&self, name: &str) -> Result<bool, PackError> {
        let (had_record, should_remove) = {
            let _guard = MANIFEST_LOCK.lock().await;
            let mut manifest = InstallManifest::load(&self.manifest_path).await?;
            let had_record = manifest.libraries.contains_key(name);
            let should_remove = manifest.remove_library(name, None);
            manifest.save(&self.manifest_path).await?;
            (had_record, should_remove)
        };

        if !should_remove {
            tracing::debug!(name, "library still referenced by collections, keeping file");
            return Ok(false);
        }

        match self.find_file(name).await {
            Some(path) => {
                tokio::fs::remove_file(&path).await?;
                tracing::info!(name, path = %path.display(), "uninstalled library");
                Ok(true)
            }
            None if had_record => Ok(true),
            None => Err(PackError::NotFound(name.to_string())),
        }
    }

    /// Install a collection from a JSON document, a URL, or a packed
    /// `.libragen-collection` archive.
    ///
    /// Per-library failures are collected, not fatal; every temporary
    /// download is deleted regardless of outcome.
    ///
    /// # Errors
    ///
    /// Resolution failures (bad document, depth, download of the document
    /// itself) abort; per-library errors land in the report.
    pub async fn install_collection(
        &self,
        source: &str,
        options: &CollectionInstallOptions,
    ) -> Result<CollectionInstallReport, PackError> {
        // Packed archives extract to a scratch dir that must outlive the
        // whole install.
        let mut _scratch: Option<tempfile::TempDir> = None;
        let effective_source = if is_collection_archive_path(Path::new(source)) {
            let extracted = unpack_collection(Path::new(source))?;
            let doc_path = extracted
                .path()
                .join(ARCHIVE_COLLECTION_FILE)
                .to_string_lossy()
                .into_owned();
            _scratch = Some(extracted);
            doc_path
        } else {
            source.to_string()
        };

        let resolved = resolve(
            &effective_source,
            &ResolveOptions {
                include_optional: options.include_optional,
                ..Default::default()
            },
        )
        .await?;

        let selected: Vec<&ResolvedLibrary> = resolved
            .libraries
            .iter()
            .filter(|library| library.required || options.include_optional)
            .collect();

        let mut report = CollectionInstallReport::default();
        for library in &selected {
            match self
                .install_collection_member(library, &resolved.name, options.force)
                .await
            {
                Ok(()) => report.installed.push(library.name.clone()),
                Err(PackError::AlreadyInstalled { name, .. }) => {
                    // The file stays; the collection still takes a reference
                    // so reference counting sees it.
                    self.record_library(&name, &library.source, Some(&resolved.name))
                        .await?;
                    report.skipped.push(name);
                }
                Err(e) => {
                    tracing::warn!(library = %library.name, error = %e, "collection member failed");
                    report.failed.push((library.name.clone(), e.to_string()));
                }
            }
        }

        let recorded: Vec<String> = report
            .installed
            .iter()
            .chain(report.skipped.iter())
            .cloned()
            .collect();
        {
            let _guard = MANIFEST_LOCK.lock().await;
            let mut manifest = InstallManifest::load(&self.manifest_path).await?;
            manifest.add_collection(InstalledCollection {
                name: resolved.name.clone(),
                source: source.to_string(),
                version: resolved.version.clone(),
                libraries: recorded,
                collections: resolved.collections.iter().skip(1).cloned().collect(),
                installed_at: chrono::Utc::now(),
            });
            manifest.save(&self.manifest_path).await?;
        }

        tracing::info!(
            collection = %resolved.name,
            installed = report.installed.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "collection install finished"
        );
        Ok(report)
    }

    async fn install_collection_member(
        &self,
        library: &ResolvedLibrary,
        collection_name: &str,
        force: bool,
    ) -> Result<(), PackError> {
        let bytes = fetch_bytes(&library.source).await?;
        if let Some(expected) = &library.sha256 {
            verify_sha256(&bytes, expected)?;
        }

        // Stage to a temp file so the artifact can be opened and validated
        // before touching the install directory. NamedTempFile removes
        // itself on drop, success or not.
        let staged = tempfile::Builder::new()
            .suffix(&format!(".{LIBRARY_EXTENSION}"))
            .tempfile()?;
        tokio::fs::write(staged.path(), &bytes).await?;

        self.install(
            staged.path(),
            &InstallOptions {
                force,
                collection_name: Some(collection_name.to_string()),
                source_uri: Some(library.source.clone()),
            },
        )
        .await?;
        Ok(())
    }

    /// Uninstall a collection: drop its record, release its references,
    /// and delete every library file whose reference set emptied.
    ///
    /// Returns the names of removed libraries.
    ///
    /// # Errors
    ///
    /// [`PackError::NotFound`] when the collection is not installed.
    pub async fn uninstall_collection(&self, name: &str) -> Result<Vec<String>, PackError> {
        let released = {
            let _guard = MANIFEST_LOCK.lock().await;
            let mut manifest = InstallManifest::load(&self.manifest_path).await?;
            let released = manifest
                .remove_collection(name)
                .ok_or_else(|| PackError::NotFound(name.to_string()))?;
            manifest.save(&self.manifest_path).await?;
            released
        };

        for library in &released {
            if let Some(path) = self.find_file(library).await {
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    tracing::warn!(library, error = %e, "failed to remove released library file");
                }
            }
        }
        tracing::info!(collection = name, removed = released.len(), "collection uninstalled");
        Ok(released)
    }

    /// Snapshot of the persistent manifest.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Json`] for a corrupt manifest file.
    pub async fn manifest(&self) -> Result<InstallManifest, PackError> {
        InstallManifest::load(&self.manifest_path).await
    }
}
