//! Row-to-struct decoding helpers.
//!
//! libsql rows are column-indexed; these helpers isolate the decoding of
//! chunk rows and the dual datetime format issue (SQLite's
//! `datetime('now')` vs Rust's `to_rfc3339()`).

use chrono::{DateTime, Utc};
use libragen_core::{SourceType, StoredChunk};

use crate::error::StoreError;

/// Column list shared by every chunk-reading query, in decode order.
pub(crate) const CHUNK_COLUMNS: &str = "id, content, source_file, source_type, source_ref, \
     content_version, start_line, end_line, language, metadata_json, created_at";

/// Parse a TEXT column as `DateTime<Utc>`, accepting both RFC 3339 and
/// SQLite's default `YYYY-MM-DD HH:MM:SS` format.
pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| StoreError::InvalidArtifact(format!("bad datetime '{s}': {e}")))
}

/// Read an optional line-number column as `Option<u32>`.
fn get_line(row: &libsql::Row, idx: i32) -> Result<Option<u32>, StoreError> {
    let raw = row.get::<Option<i64>>(idx)?;
    Ok(raw.and_then(|v| u32::try_from(v).ok()))
}

/// Decode a chunk row laid out as [`CHUNK_COLUMNS`].
pub(crate) fn chunk_from_row(row: &libsql::Row) -> Result<StoredChunk, StoreError> {
    let source_type: String = row.get(3)?;
    let metadata = match row.get::<Option<String>>(9)? {
        Some(s) if !s.is_empty() => Some(serde_json::from_str(&s)?),
        _ => None,
    };
    let created_at: String = row.get(10)?;

    Ok(StoredChunk {
        id: row.get(0)?,
        content: row.get(1)?,
        source_file: row.get(2)?,
        source_type: SourceType::from_str_lossy(&source_type),
        source_ref: row.get(4)?,
        content_version: row.get(5)?,
        start_line: get_line(row, 6)?,
        end_line: get_line(row, 7)?,
        language: row.get(8)?,
        metadata,
        created_at: parse_datetime(&created_at)?,
    })
}
