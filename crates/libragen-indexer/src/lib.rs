//! # libragen-indexer
//!
//! Orchestrates artifact builds: source ingestion (local tree or git),
//! chunking, batched embedding, and store finalization with manifest,
//! stats, and content hash.
//!
//! Progress is reported at phase boundaries
//! (`initializing → cloning? → loading-model → chunking → embedding →
//! creating-database → complete`) and per embedding batch, mapping the
//! embedding phase linearly onto 40–85%. Cancellation is honored between
//! phases and between batches; cancelled and failed builds release their
//! clone directory and remove any partially written artifact.

pub mod error;
pub mod output;
pub mod progress;

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use libragen_chunker::{Chunker, ChunkerOptions};
use libragen_core::embedder::Embedder;
use libragen_core::{
    Chunk, ChunkingConfig, ContentVersionType, EmbeddingConfig, LibraryManifest, LibraryStats,
    SourceProvenance, SourceType,
};
use libragen_sources::{
    FileAdapterOptions, GitFetchOptions, GitWorkingCopy, SourceFile, collect_files, git,
    is_git_url, parse_git_url,
};
use libragen_store::{ArtifactStore, CURRENT_SCHEMA_VERSION};

pub use error::BuildError;
pub use output::resolve_output_path;
pub use progress::{BuildPhase, BuildProgress, CancellationToken, ProgressCallback};

/// Chunks per embedding batch.
const EMBED_BATCH_SIZE: usize = 50;

/// Options for one build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Library name recorded in the manifest.
    pub name: String,
    /// Library version recorded in the manifest.
    pub version: String,
    pub description: Option<String>,
    pub agent_description: Option<String>,
    pub example_queries: Vec<String>,
    pub keywords: Vec<String>,
    pub programming_languages: Vec<String>,
    pub text_languages: Vec<String>,
    pub frameworks: Vec<String>,
    pub author: Option<String>,
    pub repository: Option<String>,
    /// Explicit SPDX licenses; beats auto-detection.
    pub licenses: Vec<String>,
    pub content_version: Option<String>,
    pub content_version_type: Option<ContentVersionType>,
    pub chunker: ChunkerOptions,
    pub files: FileAdapterOptions,
    /// Git ref override; beats any ref embedded in the source URL.
    pub git_ref: Option<String>,
    /// Git auth token override; beats provider environment lookup.
    pub auth_token: Option<String>,
    /// Extra host treated as a git provider.
    pub custom_git_host: Option<String>,
    /// Destination path or directory; see [`resolve_output_path`].
    pub output: Option<PathBuf>,
}

impl BuildOptions {
    /// Options for `name`/`version` with everything else defaulted.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: None,
            agent_description: None,
            example_queries: Vec::new(),
            keywords: Vec::new(),
            programming_languages: Vec::new(),
            text_languages: Vec::new(),
            frameworks: Vec::new(),
            author: None,
            repository: None,
            licenses: Vec::new(),
            content_version: None,
            content_version_type: None,
            chunker: ChunkerOptions::default(),
            files: FileAdapterOptions::default(),
            git_ref: None,
            auth_token: None,
            custom_git_host: None,
            output: None,
        }
    }
}

/// Result of a successful build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Where the artifact was written.
    pub output_path: PathBuf,
    /// The manifest as persisted into the artifact.
    pub manifest: LibraryManifest,
    /// Wall-clock embedding-inclusive throughput.
    pub chunks_per_second: f64,
    /// Total build duration.
    pub elapsed: std::time::Duration,
}

/// Artifact builder. One instance runs one build at a time; concurrent
/// builds need their own builder and their own destination path.
pub struct LibraryBuilder<E> {
    embedder: E,
    progress: Option<Box<ProgressCallback>>,
    cancellation: Option<CancellationToken>,
}

impl<E: Embedder> LibraryBuilder<E> {
    #[must_use]
    pub const fn new(embedder: E) -> Self {
        Self {
            embedder,
            progress: None,
            cancellation: None,
        }
    }

    /// Install a progress callback.
    #[must_use]
    pub fn on_progress(mut self, callback: impl Fn(BuildProgress) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Install a cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    fn emit(&self, phase: BuildPhase, progress: u8, message: impl Into<String>) {
        self.emit_counted(phase, progress, message, None, None);
    }

    fn emit_counted(
        &self,
        phase: BuildPhase,
        progress: u8,
        message: impl Into<String>,
        current: Option<usize>,
        total: Option<usize>,
    ) {
        if let Some(callback) = &self.progress {
            callback(BuildProgress {
                phase,
                progress,
                message: message.into(),
                current,
                total,
            });
        }
    }

    fn check_cancelled(&self) -> Result<(), BuildError> {
        if self
            .cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
        {
            return Err(BuildError::Cancelled);
        }
        Ok(())
    }

    /// Build an artifact from `source` (local path or git URL).
    ///
    /// # Errors
    ///
    /// [`BuildError::EmptyIndex`] when chunking produces nothing,
    /// [`BuildError::Cancelled`] on cancellation, and the wrapped source,
    /// store, and embedding errors otherwise. Clone directories and
    /// partially written artifacts are released on every path.
    pub async fn build(
        &mut self,
        source: &str,
        options: BuildOptions,
    ) -> Result<BuildReport, BuildError> {
        if options.name.trim().is_empty() {
            return Err(BuildError::InvalidOptions("name must not be empty".to_string()));
        }

        let mut clone: Option<GitWorkingCopy> = None;
        let mut created_output: Option<PathBuf> = None;
        let result = self
            .build_inner(source, &options, &mut clone, &mut created_output)
            .await;

        if let Some(mut copy) = clone {
            if let Err(e) = copy.cleanup() {
                tracing::warn!(error = %e, "clone cleanup failed");
            }
        }
        if result.is_err()
            && let Some(path) = created_output
        {
            let _ = tokio::fs::remove_file(&path).await;
        }
        result
    }

    async fn build_inner(
        &mut self,
        source: &str,
        options: &BuildOptions,
        clone: &mut Option<GitWorkingCopy>,
        created_output: &mut Option<PathBuf>,
    ) -> Result<BuildReport, BuildError> {
        let started = Instant::now();
        self.emit(BuildPhase::Initializing, 0, "resolving source");
        self.check_cancelled()?;

        // Source resolution: recognized git URL forms clone through the git
        // adapter, everything else is a local path.
        let custom_host = options
            .custom_git_host
            .clone()
            .or_else(git::custom_host_from_env);
        let is_git = is_git_url(source, custom_host.as_deref());
        let (files, provenance) = if is_git {
            let parsed = parse_git_url(source);
            self.emit(
                BuildPhase::Cloning,
                10,
                format!("cloning {}", parsed.repo_url),
            );
            let mut file_options = options.files.clone();
            if let Some(sub_path) = &parsed.sub_path {
                file_options.include.push(sub_path_include(sub_path));
            }
            let mut copy = git::fetch(
                &parsed.repo_url,
                GitFetchOptions {
                    ref_name: options.git_ref.clone().or(parsed.ref_name),
                    token: options.auth_token.clone(),
                    depth: 1,
                    files: file_options,
                },
            )
            .await?;
            let provenance = SourceProvenance {
                source_type: SourceType::Git,
                path: None,
                url: Some(copy.url.clone()),
                source_ref: copy.ref_name.clone(),
                commit_hash: Some(copy.commit_hash.clone()),
                licenses: resolve_licenses(options, copy.detected_license.as_ref()),
            };
            let files = std::mem::take(&mut copy.files);
            *clone = Some(copy);
            (files, provenance)
        } else {
            let root = tokio::fs::canonicalize(source).await.map_err(|_| {
                libragen_sources::SourceError::NotFound(PathBuf::from(source))
            })?;
            let files = collect_files(&root, &options.files).await?;
            let provenance = SourceProvenance {
                source_type: SourceType::File,
                path: Some(root.to_string_lossy().into_owned()),
                url: None,
                source_ref: None,
                commit_hash: None,
                licenses: resolve_licenses(options, None),
            };
            (files, provenance)
        };

        self.check_cancelled()?;
        self.emit(
            BuildPhase::LoadingModel,
            20,
            format!("preparing embedding model {}", self.embedder.model()),
        );

        self.check_cancelled()?;
        self.emit(
            BuildPhase::Chunking,
            30,
            format!("chunking {} files", files.len()),
        );
        let chunks = chunk_files(&files, options, &provenance);
        if chunks.is_empty() {
            return Err(BuildError::EmptyIndex);
        }
        tracing::debug!(files = files.len(), chunks = chunks.len(), "chunking done");

        let embeddings = self.embed_chunks(&chunks).await?;

        self.check_cancelled()?;
        let output_path = resolve_output_path(
            options.output.as_deref(),
            &options.name,
            &options.version,
            is_git,
        );
        self.emit(
            BuildPhase::CreatingDatabase,
            85,
            format!("writing {}", output_path.display()),
        );

        let store = ArtifactStore::create(&output_path, self.embedder.dimensions()).await?;
        *created_output = Some(output_path.clone());
        store.add_chunks(&chunks, &embeddings).await?;

        let content_hash = store.content_hash().await?;
        let stats = LibraryStats {
            chunk_count: store.row_count().await?,
            source_count: store.source_count().await?,
            // Measured right before the manifest write; the write itself may
            // grow the file.
            file_size: store.file_size().await?,
        };
        let manifest = self.assemble_manifest(options, provenance, stats, content_hash);
        store.set_metadata(&manifest).await?;

        let elapsed = started.elapsed();
        #[allow(clippy::cast_precision_loss)]
        let chunks_per_second = if elapsed.as_secs_f64() > 0.0 {
            chunks.len() as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        self.emit(
            BuildPhase::Complete,
            100,
            format!("indexed {} chunks", chunks.len()),
        );
        tracing::info!(
            path = %output_path.display(),
            chunks = chunks.len(),
            elapsed_ms = elapsed.as_millis(),
            "build complete"
        );

        Ok(BuildReport {
            output_path,
            manifest,
            chunks_per_second,
            elapsed,
        })
    }

    async fn embed_chunks(&mut self, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>, BuildError> {
        let total = chunks.len();
        self.emit_counted(
            BuildPhase::Embedding,
            40,
            format!("embedding {total} chunks"),
            Some(0),
            Some(total),
        );

        let mut embeddings = Vec::with_capacity(total);
        for batch in chunks.chunks(EMBED_BATCH_SIZE) {
            self.check_cancelled()?;
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let vectors = self
                .embedder
                .embed(&texts)
                .await
                .map_err(BuildError::Embedding)?;
            embeddings.extend(vectors);

            let done = embeddings.len();
            #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
            let progress = 40 + ((done as f64 / total as f64) * 45.0) as u8;
            self.emit_counted(
                BuildPhase::Embedding,
                progress,
                format!("embedded {done}/{total} chunks"),
                Some(done),
                Some(total),
            );
        }
        Ok(embeddings)
    }

    fn assemble_manifest(
        &self,
        options: &BuildOptions,
        provenance: SourceProvenance,
        stats: LibraryStats,
        content_hash: String,
    ) -> LibraryManifest {
        LibraryManifest {
            name: options.name.clone(),
            version: options.version.clone(),
            schema_version: CURRENT_SCHEMA_VERSION,
            content_version: options.content_version.clone(),
            content_version_type: options.content_version_type,
            description: options.description.clone(),
            agent_description: options.agent_description.clone(),
            example_queries: options.example_queries.clone(),
            keywords: options.keywords.clone(),
            programming_languages: options.programming_languages.clone(),
            text_languages: options.text_languages.clone(),
            frameworks: options.frameworks.clone(),
            license: provenance.licenses.first().cloned(),
            author: options.author.clone(),
            repository: options.repository.clone().or_else(|| provenance.url.clone()),
            created_at: Utc::now(),
            embedding: EmbeddingConfig {
                model: self.embedder.model().to_string(),
                dimensions: self.embedder.dimensions(),
                quantization: None,
            },
            chunking: ChunkingConfig {
                strategy: "recursive-character".to_string(),
                chunk_size: options.chunker.chunk_size,
                chunk_overlap: options.chunker.chunk_overlap,
            },
            stats,
            content_hash: Some(content_hash),
            source: Some(provenance),
        }
    }
}

/// Chunk every supported file, stamping source type, ref, and content
/// version onto each chunk. Unsupported files are skipped.
fn chunk_files(
    files: &[SourceFile],
    options: &BuildOptions,
    provenance: &SourceProvenance,
) -> Vec<Chunk> {
    let chunker = Chunker::new(options.chunker.clone());
    let mut chunks = Vec::new();
    for file in files {
        let Some(mut file_chunks) = chunker.chunk_file(&file.content, &file.relative_path) else {
            tracing::debug!(path = %file.relative_path, "unsupported extension, skipped");
            continue;
        };
        for chunk in &mut file_chunks {
            chunk.source_type = provenance.source_type;
            chunk.source_ref = provenance.source_ref.clone();
            chunk.content_version = options.content_version.clone();
        }
        chunks.extend(file_chunks);
    }
    chunks
}

/// License precedence: explicit caller list, then auto-detected (when not
/// `"Unknown"`), else none.
fn resolve_licenses(
    options: &BuildOptions,
    detected: Option<&libragen_sources::DetectedLicense>,
) -> Vec<String> {
    if !options.licenses.is_empty() {
        return options.licenses.clone();
    }
    match detected {
        Some(license) if license.identifier != "Unknown" => vec![license.identifier.clone()],
        _ => Vec::new(),
    }
}

/// Turn a URL sub-path into an include pattern: directory-shaped components
/// become a prefix glob, file-shaped ones an exact include.
fn sub_path_include(sub_path: &str) -> String {
    let trimmed = sub_path.trim_end_matches('/');
    let file_like = trimmed
        .rsplit('/')
        .next()
        .is_some_and(|last| last.contains('.'));
    if file_like {
        trimmed.to_string()
    } else {
        format!("{trimmed}/**")
    }
}
