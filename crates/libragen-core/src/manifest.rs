//! Library manifest: the typed metadata blob embedded in every artifact.
//!
//! Serialized as a single camelCase JSON value under the reserved key
//! `manifest` in the artifact's key/value table. The external format is the
//! portable contract between engines; field names here must not drift.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chunk::SourceType;

/// Interpretation of a content-version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentVersionType {
    Semver,
    Commit,
    Date,
    Revision,
    Custom,
}

/// Embedding model configuration recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingConfig {
    /// Model identifier (e.g. `"sentence-transformers/all-MiniLM-L6-v2"`).
    pub model: String,
    /// Vector dimensionality; every stored embedding has exactly this many
    /// float32 components.
    pub dimensions: usize,
    /// Optional quantization tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantization: Option<String>,
}

/// Chunking configuration recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkingConfig {
    /// Splitting strategy tag (`"recursive-character"`).
    pub strategy: String,
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between adjacent chunks in characters.
    pub chunk_overlap: usize,
}

/// Aggregate statistics filled in during finalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStats {
    /// Number of chunk rows in the artifact.
    pub chunk_count: u64,
    /// Number of distinct source files.
    pub source_count: u64,
    /// On-disk artifact size in bytes, measured at finalization.
    pub file_size: u64,
}

/// Provenance of the indexed source tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceProvenance {
    /// Kind of source that was indexed.
    #[serde(rename = "type")]
    pub source_type: SourceType,
    /// Local path, for file sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Repository URL, for git sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Ref (branch/tag) that was indexed.
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
    /// Commit hash the working copy was at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_hash: Option<String>,
    /// SPDX license identifiers that apply to the source.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub licenses: Vec<String>,
}

/// The manifest embedded in a `.libragen` artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryManifest {
    /// Library name (the install identity, not the filename).
    pub name: String,
    /// Library version.
    pub version: String,
    /// Artifact database schema version.
    pub schema_version: i64,
    /// User-chosen tag for the underlying content (orthogonal to `version`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_version_type: Option<ContentVersionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Longer description aimed at agent consumers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub example_queries: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub programming_languages: Vec<String>,
    /// ISO 639-1 codes of natural languages in the content.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub text_languages: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frameworks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    pub created_at: DateTime<Utc>,
    pub embedding: EmbeddingConfig,
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub stats: LibraryStats,
    /// `"sha256:"`-prefixed hex digest over chunk contents in id order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceProvenance>,
}
