//! Search primitives over one artifact: vector scan, BM25 keyword scan,
//! reciprocal-rank fusion, and adjacent-chunk lookup.
//!
//! Vector search is a brute-force cosine scan over the packed embedding
//! column. Keyword search goes through FTS5; the engine's bm25() is
//! lower-is-better, so the exposed score is its negation and "greater =
//! better" holds across every search path. Hybrid search fuses the two
//! candidate lists with Reciprocal Rank Fusion (C = 60, 0-based ranks).

use libragen_core::StoredChunk;

use crate::ArtifactStore;
use crate::embedding::{cosine_similarity, unpack_embedding};
use crate::error::StoreError;
use crate::helpers::{CHUNK_COLUMNS, chunk_from_row};

/// RRF constant; larger values flatten the contribution of top ranks.
const RRF_C: f32 = 60.0;

/// Characters the FTS5 tokenizer treats as syntax; stripped from queries.
const FTS_SPECIAL: &[char] = &['\'', '"', '*', '(', ')', '-'];

/// Row filter applied to every search path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    /// Restrict matches to rows with this content version.
    pub content_version: Option<String>,
}

/// A chunk with a search score; greater is better on every path.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: StoredChunk,
    pub score: f32,
}

/// Neighbors of a chunk within the same source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdjacentChunks {
    /// Chunks ending before the reference chunk, in ascending line order.
    pub before: Vec<StoredChunk>,
    /// Chunks starting after the reference chunk, in ascending line order.
    pub after: Vec<StoredChunk>,
}

/// Sanitize a raw query into an FTS5 `OR` expression.
///
/// Splits on whitespace, strips tokenizer-special characters, drops empty
/// tokens. `None` means the token set is empty and the query matches all.
fn sanitize_fts_query(query: &str) -> Option<String> {
    let tokens: Vec<String> = query
        .split_whitespace()
        .map(|t| t.replace(FTS_SPECIAL, ""))
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" OR "))
    }
}

/// Fuse ranked candidate lists by Reciprocal Rank Fusion:
/// `score(d) = Σ 1/(C + rank_i(d) + 1)` over the lists containing `d`.
/// Ties break toward the lower chunk id.
fn reciprocal_rank_fusion(lists: &[&[ScoredChunk]], k: usize) -> Vec<ScoredChunk> {
    use std::collections::BTreeMap;

    let mut fused: BTreeMap<i64, (f32, StoredChunk)> = BTreeMap::new();
    for list in lists {
        for (rank, candidate) in list.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let contribution = 1.0 / (RRF_C + rank as f32 + 1.0);
            fused
                .entry(candidate.chunk.id)
                .and_modify(|(score, _)| *score += contribution)
                .or_insert_with(|| (contribution, candidate.chunk.clone()));
        }
    }

    let mut results: Vec<ScoredChunk> = fused
        .into_iter()
        .map(|(_, (score, chunk))| ScoredChunk { chunk, score })
        .collect();
    // BTreeMap iteration is id-ascending, and the sort is stable, so equal
    // scores keep lower ids first.
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(k);
    results
}

impl ArtifactStore {
    /// Top-`k` chunks by cosine similarity to `query`, filtered.
    ///
    /// Zero-magnitude vectors score 0; ties break toward the lower id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sql`] on engine failure and
    /// [`StoreError::InvalidArtifact`] on a malformed embedding blob.
    pub async fn vector_search(
        &self,
        query: &[f32],
        k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<ScoredChunk>, StoreError> {
        let conn = self.conn()?;
        let sql = if filter.content_version.is_some() {
            format!("SELECT {CHUNK_COLUMNS}, embedding FROM chunks WHERE content_version = ?1")
        } else {
            format!("SELECT {CHUNK_COLUMNS}, embedding FROM chunks")
        };
        let mut rows = match &filter.content_version {
            Some(version) => conn.query(&sql, libsql::params![version.as_str()]).await?,
            None => conn.query(&sql, ()).await?,
        };

        let mut scored = Vec::new();
        while let Some(row) = rows.next().await? {
            let chunk = chunk_from_row(&row)?;
            let blob: Vec<u8> = row.get(11)?;
            let embedding = unpack_embedding(&blob)?;
            let score = cosine_similarity(query, &embedding);
            scored.push(ScoredChunk { chunk, score });
        }

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.chunk.id.cmp(&b.chunk.id))
        });
        scored.truncate(k);
        Ok(scored)
    }

    /// Top-`k` chunks by BM25 relevance, filtered.
    ///
    /// The exposed score is the negated engine BM25 so greater is better.
    /// An empty sanitized token set matches all rows (id order, score 0);
    /// a query the engine rejects yields an empty result, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sql`] on non-query engine failure.
    pub async fn keyword_search(
        &self,
        query: &str,
        k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<ScoredChunk>, StoreError> {
        let conn = self.conn()?;
        #[allow(clippy::cast_possible_wrap)]
        let limit = k as i64;

        let Some(match_expr) = sanitize_fts_query(query) else {
            let mut rows = match &filter.content_version {
                Some(v) => {
                    let sql = format!(
                        "SELECT {CHUNK_COLUMNS} FROM chunks
                         WHERE content_version = ?1 ORDER BY id LIMIT ?2"
                    );
                    conn.query(&sql, libsql::params![v.as_str(), limit]).await?
                }
                None => {
                    let sql =
                        format!("SELECT {CHUNK_COLUMNS} FROM chunks ORDER BY id LIMIT ?1");
                    conn.query(&sql, libsql::params![limit]).await?
                }
            };
            let mut results = Vec::new();
            while let Some(row) = rows.next().await? {
                results.push(ScoredChunk {
                    chunk: chunk_from_row(&row)?,
                    score: 0.0,
                });
            }
            return Ok(results);
        };

        let columns: String = CHUNK_COLUMNS
            .split(", ")
            .map(|c| format!("c.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {columns}, -bm25(chunks_fts) AS score
             FROM chunks_fts
             JOIN chunks c ON c.id = chunks_fts.rowid
             WHERE chunks_fts MATCH ?1{}
             ORDER BY bm25(chunks_fts)
             LIMIT ?{}",
            if filter.content_version.is_some() {
                " AND c.content_version = ?2"
            } else {
                ""
            },
            if filter.content_version.is_some() { 3 } else { 2 },
        );

        let query_result = match &filter.content_version {
            Some(v) => {
                conn.query(
                    &sql,
                    libsql::params![match_expr.as_str(), v.as_str(), limit],
                )
                .await
            }
            None => {
                conn.query(&sql, libsql::params![match_expr.as_str(), limit])
                    .await
            }
        };

        let mut rows = match query_result {
            Ok(rows) => rows,
            // FTS5 rejected the MATCH expression; treat as no matches.
            Err(e) => {
                tracing::debug!(error = %e, "FTS query rejected");
                return Ok(Vec::new());
            }
        };

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            let chunk = chunk_from_row(&row)?;
            let score: f64 = row.get(11)?;
            #[allow(clippy::cast_possible_truncation)]
            results.push(ScoredChunk {
                chunk,
                score: score as f32,
            });
        }
        Ok(results)
    }

    /// Top-`k` by RRF over `3·k` vector and `3·k` keyword candidates.
    ///
    /// # Errors
    ///
    /// Propagates the underlying search errors.
    pub async fn hybrid_search(
        &self,
        query_vec: &[f32],
        query_text: &str,
        k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<ScoredChunk>, StoreError> {
        let candidates = k.saturating_mul(3);
        let vector = self.vector_search(query_vec, candidates, filter).await?;
        let keyword = self.keyword_search(query_text, candidates, filter).await?;
        Ok(reciprocal_rank_fusion(&[&vector, &keyword], k))
    }

    /// Up to `before`/`after` line-adjacent chunks from the same source
    /// file, each side in ascending line order.
    ///
    /// A missing chunk or a chunk without line info yields empty adjacency.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sql`] on engine failure.
    pub async fn get_adjacent_chunks(
        &self,
        chunk_id: i64,
        before: usize,
        after: usize,
    ) -> Result<AdjacentChunks, StoreError> {
        let conn = self.conn()?;
        let Some(reference) = self.get_chunk(chunk_id).await? else {
            return Ok(AdjacentChunks::default());
        };
        let (Some(start_line), Some(end_line)) = (reference.start_line, reference.end_line) else {
            return Ok(AdjacentChunks::default());
        };

        let mut result = AdjacentChunks::default();

        if before > 0 {
            let sql = format!(
                "SELECT {CHUNK_COLUMNS} FROM chunks
                 WHERE source_file = ?1 AND end_line IS NOT NULL AND end_line < ?2
                 ORDER BY start_line DESC
                 LIMIT ?3"
            );
            #[allow(clippy::cast_possible_wrap)]
            let mut rows = conn
                .query(
                    &sql,
                    libsql::params![
                        reference.source_file.as_str(),
                        i64::from(start_line),
                        before as i64
                    ],
                )
                .await?;
            while let Some(row) = rows.next().await? {
                result.before.push(chunk_from_row(&row)?);
            }
            result.before.reverse();
        }

        if after > 0 {
            let sql = format!(
                "SELECT {CHUNK_COLUMNS} FROM chunks
                 WHERE source_file = ?1 AND start_line IS NOT NULL AND start_line > ?2
                 ORDER BY start_line ASC
                 LIMIT ?3"
            );
            #[allow(clippy::cast_possible_wrap)]
            let mut rows = conn
                .query(
                    &sql,
                    libsql::params![
                        reference.source_file.as_str(),
                        i64::from(end_line),
                        after as i64
                    ],
                )
                .await?;
            while let Some(row) = rows.next().await? {
                result.after.push(chunk_from_row(&row)?);
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArtifactStore;
    use libragen_core::Chunk;
    use libragen_core::test_support::HashEmbedder;
    use pretty_assertions::assert_eq;

    const DIMS: usize = 64;

    fn embed(text: &str) -> Vec<f32> {
        HashEmbedder::new(DIMS).embed_one(text)
    }

    async fn store_with(contents: &[(&str, &str, Option<(u32, u32)>)]) -> (tempfile::TempDir, ArtifactStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::create(dir.path().join("s.libragen"), DIMS)
            .await
            .unwrap();
        let chunks: Vec<Chunk> = contents
            .iter()
            .map(|(content, file, lines)| {
                let mut c = Chunk::new(*content, *file);
                if let Some((start, end)) = lines {
                    c.start_line = Some(*start);
                    c.end_line = Some(*end);
                }
                c
            })
            .collect();
        let embeddings: Vec<Vec<f32>> = chunks.iter().map(|c| embed(&c.content)).collect();
        store.add_chunks(&chunks, &embeddings).await.unwrap();
        (dir, store)
    }

    // ── FTS query sanitation ─────────────────────────────────

    #[test]
    fn sanitize_joins_tokens_with_or() {
        assert_eq!(
            sanitize_fts_query("hello world").as_deref(),
            Some("hello OR world")
        );
    }

    #[test]
    fn sanitize_strips_special_characters() {
        assert_eq!(
            sanitize_fts_query("\"quoted\" (grouped) wild* neg-ated").as_deref(),
            Some("quoted OR grouped OR wild OR negated")
        );
    }

    #[test]
    fn sanitize_drops_empty_tokens() {
        assert_eq!(sanitize_fts_query("-- \"\" ()"), None);
        assert_eq!(sanitize_fts_query("   "), None);
    }

    // ── RRF ──────────────────────────────────────────────────

    fn sc(id: i64, content: &str) -> ScoredChunk {
        use chrono::Utc;
        use libragen_core::{SourceType, StoredChunk};
        ScoredChunk {
            chunk: StoredChunk {
                id,
                content: content.to_string(),
                source_file: "a.md".to_string(),
                source_type: SourceType::File,
                source_ref: None,
                content_version: None,
                start_line: None,
                end_line: None,
                language: None,
                metadata: None,
                created_at: Utc::now(),
            },
            score: 0.0,
        }
    }

    #[test]
    fn rrf_scores_match_formula() {
        let vector = vec![sc(1, "a"), sc(2, "b")];
        let keyword = vec![sc(2, "b"), sc(3, "c")];
        let fused = reciprocal_rank_fusion(&[&vector, &keyword], 10);

        let by_id = |id: i64| fused.iter().find(|s| s.chunk.id == id).unwrap().score;
        assert!((by_id(1) - 1.0 / 61.0).abs() < 1e-6);
        assert!((by_id(2) - (1.0 / 62.0 + 1.0 / 61.0)).abs() < 1e-6);
        assert!((by_id(3) - 1.0 / 62.0).abs() < 1e-6);
    }

    #[test]
    fn rrf_doc_in_both_lists_outranks_single_list_peer() {
        // Same rank in one list each, but id 2 appears in both.
        let vector = vec![sc(1, "a"), sc(2, "b")];
        let keyword = vec![sc(2, "b"), sc(1, "a")];
        let fused = reciprocal_rank_fusion(&[&vector, &keyword], 10);
        // Both appear in both lists at mirrored ranks: equal score, lower id first.
        assert_eq!(fused[0].chunk.id, 1);

        let vector = vec![sc(1, "a")];
        let keyword = vec![sc(2, "b"), sc(1, "a")];
        let fused = reciprocal_rank_fusion(&[&vector, &keyword], 10);
        assert_eq!(fused[0].chunk.id, 1, "doc in both lists wins");
    }

    #[test]
    fn rrf_ties_break_by_lower_id() {
        let vector = vec![sc(5, "x")];
        let keyword = vec![sc(3, "y")];
        let fused = reciprocal_rank_fusion(&[&vector, &keyword], 10);
        assert_eq!(fused[0].chunk.id, 3);
        assert_eq!(fused[1].chunk.id, 5);
    }

    #[test]
    fn rrf_truncates_to_k() {
        let vector = vec![sc(1, "a"), sc(2, "b"), sc(3, "c")];
        let fused = reciprocal_rank_fusion(&[&vector], 2);
        assert_eq!(fused.len(), 2);
    }

    // ── Vector search ────────────────────────────────────────

    #[tokio::test]
    async fn vector_self_match_ranks_first() {
        let (_dir, store) = store_with(&[
            ("hello world", "a.md", None),
            ("goodbye world", "a.md", None),
            ("factorial function", "b.md", None),
        ])
        .await;

        let results = store
            .vector_search(&embed("hello world"), 2, &SearchFilter::default())
            .await
            .unwrap();
        assert_eq!(results[0].chunk.content, "hello world");
        assert!(results[0].score > 0.99);
    }

    #[tokio::test]
    async fn vector_search_respects_content_version_filter() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::create(dir.path().join("v.libragen"), DIMS)
            .await
            .unwrap();
        let mut v1 = Chunk::new("hello world", "a.md");
        v1.content_version = Some("v1".to_string());
        let mut v2 = Chunk::new("hello world again", "a.md");
        v2.content_version = Some("v2".to_string());
        store
            .add_chunks(
                &[v1, v2],
                &[embed("hello world"), embed("hello world again")],
            )
            .await
            .unwrap();

        let filter = SearchFilter {
            content_version: Some("v2".to_string()),
        };
        let results = store
            .vector_search(&embed("hello world"), 10, &filter)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.content_version.as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn zero_magnitude_query_scores_zero_everywhere() {
        let (_dir, store) = store_with(&[("hello world", "a.md", None)]).await;
        let results = store
            .vector_search(&vec![0.0; DIMS], 10, &SearchFilter::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 0.0);
    }

    // ── Keyword search ───────────────────────────────────────

    #[tokio::test]
    async fn keyword_search_scores_greater_is_better() {
        let (_dir, store) = store_with(&[
            ("hello world", "a.md", None),
            ("goodbye world", "a.md", None),
            ("factorial function", "b.md", None),
        ])
        .await;

        let results = store
            .keyword_search("world", 10, &SearchFilter::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score > 0.0, "negated bm25 must be positive");
        assert!(
            results
                .iter()
                .all(|r| r.chunk.content.contains("world"))
        );
    }

    #[tokio::test]
    async fn keyword_porter_stemming_matches_inflections() {
        let (_dir, store) = store_with(&[
            ("spawning new tasks", "a.md", None),
            ("the task was spawned", "a.md", None),
            ("unrelated content", "b.md", None),
        ])
        .await;

        let results = store
            .keyword_search("spawn", 10, &SearchFilter::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn empty_token_set_matches_all_in_id_order() {
        let (_dir, store) = store_with(&[
            ("first", "a.md", None),
            ("second", "a.md", None),
        ])
        .await;

        let results = store
            .keyword_search("-- ()", 10, &SearchFilter::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.id, 1);
        assert_eq!(results[1].chunk.id, 2);
    }

    // ── Hybrid search ────────────────────────────────────────

    #[tokio::test]
    async fn hybrid_ranks_keyword_matches_above_nonmatches() {
        let (_dir, store) = store_with(&[
            ("hello world", "a.md", None),
            ("goodbye world", "a.md", None),
            ("factorial function", "b.md", None),
        ])
        .await;

        let results = store
            .hybrid_search(&embed("world"), "world", 2, &SearchFilter::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        let contents: Vec<&str> = results.iter().map(|r| r.chunk.content.as_str()).collect();
        assert!(contents.contains(&"hello world"));
        assert!(contents.contains(&"goodbye world"));
    }

    // ── Adjacency ────────────────────────────────────────────

    #[tokio::test]
    async fn adjacent_chunks_by_line_ranges() {
        let (_dir, store) = store_with(&[
            ("first block", "doc.md", Some((1, 10))),
            ("second block", "doc.md", Some((11, 20))),
            ("third block", "doc.md", Some((21, 30))),
        ])
        .await;

        let adjacent = store.get_adjacent_chunks(2, 1, 1).await.unwrap();
        assert_eq!(adjacent.before.len(), 1);
        assert_eq!(adjacent.before[0].content, "first block");
        assert_eq!(adjacent.after.len(), 1);
        assert_eq!(adjacent.after[0].content, "third block");
    }

    #[tokio::test]
    async fn adjacency_stays_within_the_source_file() {
        let (_dir, store) = store_with(&[
            ("a lines", "a.md", Some((1, 5))),
            ("b lines", "b.md", Some((1, 5))),
            ("a later", "a.md", Some((6, 10))),
        ])
        .await;

        let adjacent = store.get_adjacent_chunks(3, 5, 5).await.unwrap();
        assert_eq!(adjacent.before.len(), 1);
        assert_eq!(adjacent.before[0].content, "a lines");
        assert!(adjacent.after.is_empty());
    }

    #[tokio::test]
    async fn adjacency_without_line_info_is_empty() {
        let (_dir, store) = store_with(&[
            ("no lines here", "a.md", None),
            ("neighbor", "a.md", Some((1, 2))),
        ])
        .await;

        let adjacent = store.get_adjacent_chunks(1, 3, 3).await.unwrap();
        assert!(adjacent.before.is_empty());
        assert!(adjacent.after.is_empty());
    }

    #[tokio::test]
    async fn adjacency_of_missing_chunk_is_empty() {
        let (_dir, store) = store_with(&[("only", "a.md", Some((1, 1)))]).await;
        let adjacent = store.get_adjacent_chunks(99, 2, 2).await.unwrap();
        assert_eq!(adjacent, AdjacentChunks::default());
    }

    #[tokio::test]
    async fn before_chunks_return_in_ascending_order() {
        let (_dir, store) = store_with(&[
            ("one", "d.md", Some((1, 2))),
            ("two", "d.md", Some((3, 4))),
            ("three", "d.md", Some((5, 6))),
            ("ref", "d.md", Some((7, 8))),
        ])
        .await;

        let adjacent = store.get_adjacent_chunks(4, 2, 0).await.unwrap();
        let contents: Vec<&str> = adjacent.before.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["two", "three"]);
    }
}
