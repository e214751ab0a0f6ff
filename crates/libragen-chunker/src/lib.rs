//! # libragen-chunker
//!
//! Language-aware chunking of source files for embedding.
//!
//! Files are split with a recursive character splitter driven by per-language
//! separator priority lists (see [`language`]), producing segments no larger
//! than `chunk_size` characters with `chunk_overlap` characters of overlap.
//! Each segment keeps its 1-based source line range, recovered by searching
//! for the segment text from a non-decreasing cursor in the original file.

pub mod language;
pub mod splitter;

use libragen_core::{Chunk, SourceType};
use serde::{Deserialize, Serialize};

pub use language::{DEFAULT_TEXT_EXTENSIONS, LanguageInfo, SeparatorClass, detect_language};

/// Default maximum chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default overlap between adjacent chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Chunker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkerOptions {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between adjacent chunks in characters.
    pub chunk_overlap: usize,
    /// Extra extensions (beyond the built-in set) treated as plain text.
    #[serde(default)]
    pub text_extensions: Vec<String>,
}

impl Default for ChunkerOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            text_extensions: Vec::new(),
        }
    }
}

/// Splits file contents into [`Chunk`]s.
#[derive(Debug, Clone, Default)]
pub struct Chunker {
    options: ChunkerOptions,
}

impl Chunker {
    #[must_use]
    pub const fn new(options: ChunkerOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub const fn options(&self) -> &ChunkerOptions {
        &self.options
    }

    /// Chunk one file.
    ///
    /// Returns `None` when the file's extension is unsupported (the caller
    /// skips such files). Produced chunks carry `relative_path`, the
    /// detected language tag, and line ranges where recoverable; the caller
    /// fills in source type, ref, and content version.
    #[must_use]
    pub fn chunk_file(&self, content: &str, relative_path: &str) -> Option<Vec<Chunk>> {
        let info = detect_language(relative_path, &self.options.text_extensions)?;
        let segments = splitter::split_text(
            content,
            info.class.separators(),
            self.options.chunk_size,
            self.options.chunk_overlap,
        );

        let mut chunks = Vec::with_capacity(segments.len());
        let mut cursor = 0usize;
        for segment in segments {
            let (start_line, end_line) = match locate(content, &segment, &mut cursor) {
                Some(lines) => (Some(lines.0), Some(lines.1)),
                None => (None, None),
            };
            chunks.push(Chunk {
                content: segment,
                source_file: relative_path.to_string(),
                source_type: SourceType::File,
                source_ref: None,
                content_version: None,
                start_line,
                end_line,
                language: Some(info.tag.to_string()),
                metadata: None,
            });
        }
        Some(chunks)
    }
}

/// Locate `segment` in `content` searching forward from `*cursor` (a byte
/// offset), and return its 1-based inclusive line range. The cursor only
/// moves forward, so repeated text resolves to successive occurrences.
fn locate(content: &str, segment: &str, cursor: &mut usize) -> Option<(u32, u32)> {
    let haystack = content.get(*cursor..)?;
    let rel = haystack.find(segment)?;
    let pos = *cursor + rel;

    #[allow(clippy::cast_possible_truncation)]
    let start_line = 1 + content.as_bytes()[..pos]
        .iter()
        .filter(|b| **b == b'\n')
        .count() as u32;
    #[allow(clippy::cast_possible_truncation)]
    let segment_lines = segment.lines().count().max(1) as u32;
    let end_line = start_line + segment_lines - 1;

    // Advance past the first character so an overlapping next segment
    // (which starts strictly later) can still be found.
    *cursor = pos + segment.chars().next().map_or(1, char::len_utf8);

    Some((start_line, end_line))
}
