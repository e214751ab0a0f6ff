//! Chunk data model.
//!
//! A chunk is a contiguous slice of one source file. Chunks are created by
//! the chunker during a build, assigned a 1-based id on insertion into the
//! artifact store, and are immutable thereafter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of source a chunk was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Local file or directory.
    File,
    /// Git repository (working copy or clone).
    Git,
}

impl SourceType {
    /// Stable storage tag for this source type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Git => "git",
        }
    }

    /// Parse a storage tag back into a source type. Unknown tags map to
    /// [`SourceType::File`] so older artifacts keep opening.
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "git" => Self::Git,
            _ => Self::File,
        }
    }
}

/// A chunk prior to insertion; no id yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// UTF-8 chunk text.
    pub content: String,
    /// Source file path, relative to the index root.
    pub source_file: String,
    /// Kind of source the chunk came from.
    pub source_type: SourceType,
    /// Optional source ref (e.g. a branch name).
    pub source_ref: Option<String>,
    /// Optional content-version tag (e.g. `"v1.74.0"`).
    pub content_version: Option<String>,
    /// 1-based first line of the chunk in its source file, inclusive.
    pub start_line: Option<u32>,
    /// 1-based last line of the chunk in its source file, inclusive.
    pub end_line: Option<u32>,
    /// Detected language tag (e.g. `"rust"`, `"markdown"`).
    pub language: Option<String>,
    /// Arbitrary key/value metadata.
    pub metadata: Option<serde_json::Value>,
}

impl Chunk {
    /// Minimal chunk with just content and a source file, `file`-typed.
    #[must_use]
    pub fn new(content: impl Into<String>, source_file: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source_file: source_file.into(),
            source_type: SourceType::File,
            source_ref: None,
            content_version: None,
            start_line: None,
            end_line: None,
            language: None,
            metadata: None,
        }
    }
}

/// A chunk as persisted in an artifact: input fields plus id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChunk {
    /// 1-based id assigned in insertion order.
    pub id: i64,
    pub content: String,
    pub source_file: String,
    pub source_type: SourceType,
    pub source_ref: Option<String>,
    pub content_version: Option<String>,
    pub start_line: Option<u32>,
    pub end_line: Option<u32>,
    pub language: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
