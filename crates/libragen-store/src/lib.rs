//! # libragen-store
//!
//! Single-file library artifact store.
//!
//! An artifact (`*.libragen`) is one libSQL database holding chunk rows with
//! packed float32 embeddings, an FTS5 index over chunk content (porter +
//! unicode61, kept in sync by triggers), and a key/value table carrying the
//! schema version and the library manifest. WAL journaling lets readers
//! proceed alongside a single writer; all multi-row writes run in one
//! transaction.
//!
//! [`ArtifactStore`] owns the file handle; [`Library`] wraps a store
//! together with its parsed manifest and is the read-side entry point.

pub mod embedding;
pub mod error;
mod helpers;
pub mod library;
pub mod migrations;
pub mod search;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use libragen_core::{Chunk, LibraryManifest, StoredChunk};
use sha2::{Digest, Sha256};

use crate::embedding::pack_embedding;
use crate::error::StoreError;
use crate::helpers::{CHUNK_COLUMNS, chunk_from_row};
use crate::migrations::{MANIFEST_KEY, MIGRATIONS, SCHEMA_VERSION_KEY};

pub use crate::library::Library;
pub use crate::migrations::{CURRENT_SCHEMA_VERSION, Migration};
pub use crate::search::{AdjacentChunks, ScoredChunk, SearchFilter};

/// Open handle to a single artifact file.
///
/// One store owns one on-disk file and its connection. Closing is
/// idempotent; any call after close fails with [`StoreError::Closed`].
pub struct ArtifactStore {
    path: PathBuf,
    _db: Option<libsql::Database>,
    conn: Option<libsql::Connection>,
    dimensions: usize,
    read_only: bool,
}

impl std::fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("path", &self.path)
            .field("dimensions", &self.dimensions)
            .field("read_only", &self.read_only)
            .field("open", &self.conn.is_some())
            .finish()
    }
}

async fn connect(path: &Path) -> Result<(libsql::Database, libsql::Connection), StoreError> {
    let db = libsql::Builder::new_local(path).build().await?;
    let conn = db.connect()?;
    // Readers must not block the single writer.
    let mut rows = conn.query("PRAGMA journal_mode = WAL", ()).await?;
    let _ = rows.next().await?;
    Ok((db, conn))
}

impl ArtifactStore {
    /// Create a new artifact at `path`, replacing any existing file, with
    /// the full schema applied and `schema_version` set to
    /// [`CURRENT_SCHEMA_VERSION`].
    ///
    /// `dimensions` fixes the embedding dimensionality every inserted chunk
    /// must match.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] on filesystem failure and
    /// [`StoreError::Sql`] when schema creation fails.
    pub async fn create(path: impl Into<PathBuf>, dimensions: usize) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let (db, conn) = connect(&path).await?;
        migrations::apply_fresh(&conn, MIGRATIONS).await?;

        Ok(Self {
            path,
            _db: Some(db),
            conn: Some(conn),
            dimensions,
            read_only: false,
        })
    }

    /// Open an existing artifact writable, running any pending migrations
    /// under the backup/restore envelope first.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] when the file does not exist.
    /// - [`StoreError::SchemaVersion`] when the artifact is newer than this
    ///   engine.
    /// - [`StoreError::InvalidArtifact`] when the manifest is missing.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open_inner(path.into(), false).await
    }

    /// Open an existing artifact read-only.
    ///
    /// # Errors
    ///
    /// As [`ArtifactStore::open`], plus [`StoreError::MigrationRequired`]
    /// when the artifact is behind the current schema.
    pub async fn open_read_only(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open_inner(path.into(), true).await
    }

    async fn open_inner(path: PathBuf, read_only: bool) -> Result<Self, StoreError> {
        if !path.is_file() {
            return Err(StoreError::NotFound(path));
        }

        if read_only {
            migrations::check_schema(&path, MIGRATIONS).await?;
        } else {
            migrations::migrate(&path, MIGRATIONS).await?;
        }

        let (db, conn) = connect(&path).await?;
        let mut store = Self {
            path,
            _db: Some(db),
            conn: Some(conn),
            dimensions: 0,
            read_only,
        };

        let manifest: LibraryManifest = store
            .get_metadata()
            .await?
            .ok_or_else(|| StoreError::InvalidArtifact("manifest is missing".to_string()))?;
        store.dimensions = manifest.embedding.dimensions;
        Ok(store)
    }

    /// Release the handle. Idempotent.
    pub fn close(&mut self) {
        self.conn = None;
        self._db = None;
    }

    /// Artifact file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configured embedding dimensionality.
    #[must_use]
    pub const fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub(crate) fn conn(&self) -> Result<&libsql::Connection, StoreError> {
        self.conn.as_ref().ok_or(StoreError::Closed)
    }

    fn writable(&self) -> Result<&libsql::Connection, StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        self.conn()
    }

    /// Insert one chunk with its embedding; returns the assigned id.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::Dimensions`] when the embedding length does
    /// not match the configured dimensionality, [`StoreError::Closed`] on a
    /// closed store.
    pub async fn add_chunk(&self, chunk: &Chunk, embedding: &[f32]) -> Result<i64, StoreError> {
        let ids = self
            .add_chunks(std::slice::from_ref(chunk), &[embedding.to_vec()])
            .await?;
        Ok(ids[0])
    }

    /// Insert a batch of chunks atomically; ids are assigned in input order.
    ///
    /// The whole batch runs in one transaction with a reused prepared
    /// statement; any single-row failure rolls the batch back.
    ///
    /// # Errors
    ///
    /// [`StoreError::LengthMismatch`] when the slices disagree,
    /// [`StoreError::Dimensions`] on any wrong-size embedding (checked
    /// before writing), [`StoreError::Sql`] on engine failure.
    pub async fn add_chunks(
        &self,
        chunks: &[Chunk],
        embeddings: &[Vec<f32>],
    ) -> Result<Vec<i64>, StoreError> {
        let conn = self.writable()?;
        if chunks.len() != embeddings.len() {
            return Err(StoreError::LengthMismatch {
                chunks: chunks.len(),
                embeddings: embeddings.len(),
            });
        }
        for embedding in embeddings {
            if embedding.len() != self.dimensions {
                return Err(StoreError::Dimensions {
                    expected: self.dimensions,
                    got: embedding.len(),
                });
            }
        }

        conn.execute("BEGIN", ()).await?;
        let result = Self::insert_rows(conn, chunks, embeddings).await;
        match result {
            Ok(ids) => {
                conn.execute("COMMIT", ()).await?;
                Ok(ids)
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", ()).await;
                Err(e)
            }
        }
    }

    async fn insert_rows(
        conn: &libsql::Connection,
        chunks: &[Chunk],
        embeddings: &[Vec<f32>],
    ) -> Result<Vec<i64>, StoreError> {
        let mut stmt = conn
            .prepare(
                "INSERT INTO chunks (
                    content, embedding, source_file, source_type, source_ref,
                    content_version, start_line, end_line, language,
                    metadata_json, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )
            .await?;

        let mut ids = Vec::with_capacity(chunks.len());
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            let metadata_json = chunk
                .metadata
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;
            stmt.execute(libsql::params![
                chunk.content.as_str(),
                pack_embedding(embedding),
                chunk.source_file.as_str(),
                chunk.source_type.as_str(),
                chunk.source_ref.as_deref(),
                chunk.content_version.as_deref(),
                chunk.start_line.map(i64::from),
                chunk.end_line.map(i64::from),
                chunk.language.as_deref(),
                metadata_json,
                Utc::now().to_rfc3339(),
            ])
            .await?;
            ids.push(conn.last_insert_rowid());
            stmt.reset();
        }
        Ok(ids)
    }

    /// Fetch one chunk by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sql`] on engine failure.
    pub async fn get_chunk(&self, id: i64) -> Result<Option<StoredChunk>, StoreError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                &format!("SELECT {CHUNK_COLUMNS} FROM chunks WHERE id = ?1"),
                libsql::params![id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(chunk_from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// All chunks ordered by id ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sql`] on engine failure.
    pub async fn all_chunks(&self) -> Result<Vec<StoredChunk>, StoreError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                &format!("SELECT {CHUNK_COLUMNS} FROM chunks ORDER BY id"),
                (),
            )
            .await?;
        let mut chunks = Vec::new();
        while let Some(row) = rows.next().await? {
            chunks.push(chunk_from_row(&row)?);
        }
        Ok(chunks)
    }

    /// Number of chunk rows.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sql`] on engine failure.
    pub async fn row_count(&self) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        let mut rows = conn.query("SELECT COUNT(*) FROM chunks", ()).await?;
        let row = rows.next().await?.ok_or(StoreError::InvalidArtifact(
            "COUNT returned no row".to_string(),
        ))?;
        let count: i64 = row.get(0)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Number of distinct source files.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sql`] on engine failure.
    pub async fn source_count(&self) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query("SELECT COUNT(DISTINCT source_file) FROM chunks", ())
            .await?;
        let row = rows.next().await?.ok_or(StoreError::InvalidArtifact(
            "COUNT returned no row".to_string(),
        ))?;
        let count: i64 = row.get(0)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Content hash: `"sha256:" + hex(sha256(concat(content, id ascending)))`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sql`] on engine failure.
    pub async fn content_hash(&self) -> Result<String, StoreError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query("SELECT content FROM chunks ORDER BY id", ())
            .await?;
        let mut hasher = Sha256::new();
        while let Some(row) = rows.next().await? {
            let content: String = row.get(0)?;
            hasher.update(content.as_bytes());
        }
        Ok(format!("sha256:{:x}", hasher.finalize()))
    }

    /// On-disk size of the artifact file in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the file cannot be stat'ed.
    pub async fn file_size(&self) -> Result<u64, StoreError> {
        Ok(tokio::fs::metadata(&self.path).await?.len())
    }

    /// Set one key/value pair in `library_meta`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sql`] on engine failure, [`StoreError::ReadOnly`]
    /// on a read-only store.
    pub async fn set_meta(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.writable()?;
        conn.execute(
            "INSERT INTO library_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            libsql::params![key, value],
        )
        .await?;
        Ok(())
    }

    /// Read one value from `library_meta`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sql`] on engine failure.
    pub async fn get_meta(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "SELECT value FROM library_meta WHERE key = ?1",
                libsql::params![key],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// All key/value pairs in `library_meta`, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sql`] on engine failure.
    pub async fn get_all_meta(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query("SELECT key, value FROM library_meta ORDER BY key", ())
            .await?;
        let mut meta = BTreeMap::new();
        while let Some(row) = rows.next().await? {
            meta.insert(row.get::<String>(0)?, row.get::<String>(1)?);
        }
        Ok(meta)
    }

    /// Serialize `value` as JSON under the reserved `manifest` key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Json`] when serialization fails.
    pub async fn set_metadata<T: serde::Serialize>(&self, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string(value)?;
        self.set_meta(MANIFEST_KEY, &json).await
    }

    /// Deserialize the `manifest` key, if present.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidArtifact`] when the stored manifest is
    /// not valid JSON for `T`.
    pub async fn get_metadata<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<Option<T>, StoreError> {
        match self.get_meta(MANIFEST_KEY).await? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| StoreError::InvalidArtifact(format!("bad manifest: {e}"))),
            None => Ok(None),
        }
    }

    /// Stored schema version as an integer (0 when absent).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidArtifact`] when the stored value is not
    /// an integer.
    pub async fn schema_version(&self) -> Result<i64, StoreError> {
        match self.get_meta(SCHEMA_VERSION_KEY).await? {
            Some(raw) => raw.parse::<i64>().map_err(|_| {
                StoreError::InvalidArtifact(format!("schema_version is not an integer: {raw}"))
            }),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libragen_core::SourceType;
    use libragen_core::test_support::HashEmbedder;
    use pretty_assertions::assert_eq;

    const DIMS: usize = 16;

    async fn fresh_store() -> (tempfile::TempDir, ArtifactStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::create(dir.path().join("t.libragen"), DIMS)
            .await
            .unwrap();
        (dir, store)
    }

    fn chunk(content: &str, file: &str, lines: Option<(u32, u32)>) -> Chunk {
        let mut c = Chunk::new(content, file);
        if let Some((start, end)) = lines {
            c.start_line = Some(start);
            c.end_line = Some(end);
        }
        c
    }

    fn embed(text: &str) -> Vec<f32> {
        HashEmbedder::new(DIMS).embed_one(text)
    }

    #[tokio::test]
    async fn ids_are_one_based_and_sequential() {
        let (_dir, store) = fresh_store().await;
        let chunks = vec![
            chunk("first", "a.md", None),
            chunk("second", "a.md", None),
            chunk("third", "b.md", None),
        ];
        let embeddings: Vec<Vec<f32>> = chunks.iter().map(|c| embed(&c.content)).collect();
        let ids = store.add_chunks(&chunks, &embeddings).await.unwrap();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn wrong_dimension_embedding_is_rejected() {
        let (_dir, store) = fresh_store().await;
        let err = store
            .add_chunk(&chunk("x", "a.md", None), &[1.0, 0.0])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Dimensions {
                expected: DIMS,
                got: 2
            }
        ));
    }

    #[tokio::test]
    async fn length_mismatch_is_rejected() {
        let (_dir, store) = fresh_store().await;
        let err = store
            .add_chunks(&[chunk("x", "a.md", None)], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::LengthMismatch { .. }));
    }

    #[tokio::test]
    async fn batch_failure_rolls_back_everything() {
        let (_dir, store) = fresh_store().await;
        let chunks = vec![chunk("good", "a.md", None), chunk("bad", "a.md", None)];
        let embeddings = vec![embed("good"), vec![0.0; DIMS + 1]];
        assert!(store.add_chunks(&chunks, &embeddings).await.is_err());
        assert_eq!(store.row_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn fts_stays_in_sync_with_chunks() {
        let (_dir, store) = fresh_store().await;
        let chunks = vec![
            chunk("hello world", "a.md", None),
            chunk("goodbye world", "a.md", None),
        ];
        let embeddings: Vec<Vec<f32>> = chunks.iter().map(|c| embed(&c.content)).collect();
        store.add_chunks(&chunks, &embeddings).await.unwrap();

        // One FTS row per chunk id with identical content.
        let conn = store.conn().unwrap();
        let mut rows = conn
            .query(
                "SELECT c.id, c.content, f.content
                 FROM chunks c JOIN chunks_fts f ON f.rowid = c.id
                 ORDER BY c.id",
                (),
            )
            .await
            .unwrap();
        let mut seen = 0;
        while let Some(row) = rows.next().await.unwrap() {
            let chunk_content: String = row.get(1).unwrap();
            let fts_content: String = row.get(2).unwrap();
            assert_eq!(chunk_content, fts_content);
            seen += 1;
        }
        assert_eq!(seen, 2);
    }

    #[tokio::test]
    async fn metadata_round_trips_through_json() {
        let (_dir, store) = fresh_store().await;
        let mut c = chunk("with meta", "a.md", Some((1, 2)));
        c.metadata = Some(serde_json::json!({"kind": "heading", "depth": 2}));
        c.source_type = SourceType::Git;
        c.source_ref = Some("main".to_string());
        c.content_version = Some("v1".to_string());
        c.language = Some("markdown".to_string());
        let id = store.add_chunk(&c, &embed("with meta")).await.unwrap();

        let stored = store.get_chunk(id).await.unwrap().unwrap();
        assert_eq!(stored.metadata, c.metadata);
        assert_eq!(stored.source_type, SourceType::Git);
        assert_eq!(stored.source_ref.as_deref(), Some("main"));
        assert_eq!(stored.content_version.as_deref(), Some("v1"));
        assert_eq!(stored.start_line, Some(1));
        assert_eq!(stored.end_line, Some(2));
    }

    #[tokio::test]
    async fn meta_kv_set_get_all() {
        let (_dir, store) = fresh_store().await;
        store.set_meta("alpha", "1").await.unwrap();
        store.set_meta("beta", "2").await.unwrap();
        store.set_meta("alpha", "3").await.unwrap();

        assert_eq!(store.get_meta("alpha").await.unwrap().as_deref(), Some("3"));
        assert_eq!(store.get_meta("missing").await.unwrap(), None);
        let all = store.get_all_meta().await.unwrap();
        // schema_version plus the two keys above.
        assert_eq!(all.len(), 3);
        assert_eq!(all["beta"], "2");
    }

    #[tokio::test]
    async fn schema_version_is_current_after_create() {
        let (_dir, store) = fresh_store().await;
        assert_eq!(store.schema_version().await.unwrap(), CURRENT_SCHEMA_VERSION);
        assert_eq!(
            store.get_meta(SCHEMA_VERSION_KEY).await.unwrap().as_deref(),
            Some(CURRENT_SCHEMA_VERSION.to_string().as_str())
        );
    }

    #[tokio::test]
    async fn content_hash_is_stable_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.libragen");

        let hash = {
            let store = ArtifactStore::create(&path, DIMS).await.unwrap();
            let chunks = vec![chunk("alpha", "a.md", None), chunk("beta", "a.md", None)];
            let embeddings: Vec<Vec<f32>> = chunks.iter().map(|c| embed(&c.content)).collect();
            store.add_chunks(&chunks, &embeddings).await.unwrap();
            store
                .set_metadata(&minimal_manifest(2, &store.content_hash().await.unwrap()))
                .await
                .unwrap();
            store.content_hash().await.unwrap()
        };

        let store = ArtifactStore::open(&path).await.unwrap();
        assert_eq!(store.row_count().await.unwrap(), 2);
        assert_eq!(store.content_hash().await.unwrap(), hash);

        // Hash must equal sha256 over concatenated contents in id order.
        let mut hasher = Sha256::new();
        hasher.update(b"alpha");
        hasher.update(b"beta");
        assert_eq!(hash, format!("sha256:{:x}", hasher.finalize()));
    }

    #[tokio::test]
    async fn close_is_idempotent_and_blocks_use() {
        let (_dir, mut store) = fresh_store().await;
        store.close();
        store.close();
        assert!(matches!(
            store.row_count().await.unwrap_err(),
            StoreError::Closed
        ));
    }

    #[tokio::test]
    async fn open_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArtifactStore::open(dir.path().join("nope.libragen"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn open_without_manifest_is_invalid_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.libragen");
        {
            let _store = ArtifactStore::create(&path, DIMS).await.unwrap();
        }
        let err = ArtifactStore::open(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidArtifact(_)));
    }

    #[tokio::test]
    async fn read_only_store_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ro.libragen");
        {
            let store = ArtifactStore::create(&path, DIMS).await.unwrap();
            store
                .add_chunk(&chunk("x", "a.md", None), &embed("x"))
                .await
                .unwrap();
            store
                .set_metadata(&minimal_manifest(1, "sha256:x"))
                .await
                .unwrap();
        }
        let store = ArtifactStore::open_read_only(&path).await.unwrap();
        let err = store
            .add_chunk(&chunk("y", "a.md", None), &embed("y"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ReadOnly));
    }

    pub(crate) fn minimal_manifest(chunk_count: u64, hash: &str) -> LibraryManifest {
        use libragen_core::{ChunkingConfig, EmbeddingConfig, LibraryStats};
        LibraryManifest {
            name: "test".to_string(),
            version: "0.1.0".to_string(),
            schema_version: CURRENT_SCHEMA_VERSION,
            content_version: None,
            content_version_type: None,
            description: None,
            agent_description: None,
            example_queries: Vec::new(),
            keywords: Vec::new(),
            programming_languages: Vec::new(),
            text_languages: Vec::new(),
            frameworks: Vec::new(),
            license: None,
            author: None,
            repository: None,
            created_at: Utc::now(),
            embedding: EmbeddingConfig {
                model: "test/hash-embedder".to_string(),
                dimensions: DIMS,
                quantization: None,
            },
            chunking: ChunkingConfig {
                strategy: "recursive-character".to_string(),
                chunk_size: 1000,
                chunk_overlap: 200,
            },
            stats: LibraryStats {
                chunk_count,
                source_count: 1,
                file_size: 0,
            },
            content_hash: Some(hash.to_string()),
            source: None,
        }
    }
}
