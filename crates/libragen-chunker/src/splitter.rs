//! Recursive character splitting.
//!
//! Splits text by a priority-ordered separator list: the first separator
//! that occurs in the text partitions it, oversized parts recurse with the
//! remaining separators, and adjacent parts are merged back up to the chunk
//! size with a tail overlap. Sizes are measured in characters.
//!
//! Separators stay attached to the piece that follows them, so every
//! produced segment is a contiguous substring of the input (modulo edge
//! trimming). That property is what makes line-number recovery by substring
//! search exact.

use std::collections::VecDeque;

/// Split `text` into trimmed segments of at most `chunk_size` chars with
/// `chunk_overlap` chars of tail overlap between adjacent segments.
///
/// `separators` is tried in order; the empty separator must be last and
/// splits at character granularity. Whitespace-only segments are dropped.
#[must_use]
pub fn split_text(
    text: &str,
    separators: &[&str],
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let chunk_overlap = chunk_overlap.min(chunk_size.saturating_sub(1));

    let mut segments = Vec::new();
    split_recursive(text, separators, chunk_size, chunk_overlap, &mut segments);

    segments
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn split_recursive(
    text: &str,
    separators: &[&str],
    chunk_size: usize,
    chunk_overlap: usize,
    out: &mut Vec<String>,
) {
    if char_len(text) <= chunk_size {
        out.push(text.to_string());
        return;
    }

    let (separator, rest) = pick_separator(text, separators);
    let parts = split_keep_separator(text, separator);

    // Parts small enough to merge accumulate in `pending`; an oversized part
    // flushes the accumulator and recurses with weaker separators.
    let mut pending: Vec<&str> = Vec::new();
    for part in parts {
        if char_len(part) <= chunk_size {
            pending.push(part);
        } else {
            merge_parts(&pending, chunk_size, chunk_overlap, out);
            pending.clear();
            if rest.is_empty() {
                hard_split(part, chunk_size, chunk_overlap, out);
            } else {
                split_recursive(part, rest, chunk_size, chunk_overlap, out);
            }
        }
    }
    merge_parts(&pending, chunk_size, chunk_overlap, out);
}

/// First separator that occurs in `text`, plus the remaining (weaker) list.
/// The empty separator matches everything and terminates the recursion.
fn pick_separator<'s>(text: &str, separators: &'s [&'s str]) -> (&'s str, &'s [&'s str]) {
    for (i, sep) in separators.iter().enumerate() {
        if sep.is_empty() || text.contains(sep) {
            return (sep, separators.get(i + 1..).unwrap_or(&[]));
        }
    }
    ("", &[])
}

/// Split on `separator`, keeping each separator attached to the part that
/// follows it. Concatenating the result reproduces `text` exactly.
fn split_keep_separator<'t>(text: &'t str, separator: &str) -> Vec<&'t str> {
    if separator.is_empty() {
        return vec![text];
    }
    let mut parts = Vec::new();
    let mut start = 0;
    for (pos, _) in text.match_indices(separator) {
        if pos > start {
            parts.push(&text[start..pos]);
        }
        start = pos;
    }
    if start < text.len() {
        parts.push(&text[start..]);
    }
    parts
}

/// Merge consecutive small parts into chunks of at most `chunk_size` chars,
/// carrying a tail window of at most `chunk_overlap` chars forward.
fn merge_parts(parts: &[&str], chunk_size: usize, chunk_overlap: usize, out: &mut Vec<String>) {
    let mut window: VecDeque<&str> = VecDeque::new();
    let mut total = 0usize;

    for part in parts {
        let part_len = char_len(part);
        if total + part_len > chunk_size && !window.is_empty() {
            out.push(window.iter().copied().collect());
            while total > chunk_overlap || (total + part_len > chunk_size && total > 0) {
                let Some(front) = window.pop_front() else {
                    break;
                };
                total -= char_len(front);
            }
        }
        window.push_back(part);
        total += part_len;
    }

    if !window.is_empty() {
        out.push(window.iter().copied().collect());
    }
}

/// Character-granularity fallback for parts no separator can break.
fn hard_split(text: &str, chunk_size: usize, chunk_overlap: usize, out: &mut Vec<String>) {
    let chars: Vec<char> = text.chars().collect();
    let stride = chunk_size.saturating_sub(chunk_overlap).max(1);
    let mut start = 0;
    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        out.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += stride;
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PLAIN: &[&str] = &["\n\n", "\n", " ", ""];

    #[test]
    fn short_text_is_one_segment() {
        let segments = split_text("hello world", PLAIN, 100, 10);
        assert_eq!(segments, vec!["hello world"]);
    }

    #[test]
    fn splits_on_strongest_separator_first() {
        let text = "para one line a\npara one line b\n\npara two line a\npara two line b";
        let segments = split_text(text, PLAIN, 40, 0);
        assert_eq!(segments.len(), 2);
        assert!(segments[0].contains("para one"));
        assert!(segments[1].contains("para two"));
    }

    #[test]
    fn segments_respect_chunk_size() {
        let text = "word ".repeat(200);
        for segment in split_text(&text, PLAIN, 50, 10) {
            assert!(
                segment.chars().count() <= 50,
                "segment too long: {} chars",
                segment.chars().count()
            );
        }
    }

    #[test]
    fn adjacent_segments_overlap() {
        let text = (0..40).map(|i| format!("token{i}")).collect::<Vec<_>>().join(" ");
        let segments = split_text(&text, PLAIN, 60, 20);
        assert!(segments.len() >= 2);
        for pair in segments.windows(2) {
            let tail: String = pair[0]
                .chars()
                .rev()
                .take(8)
                .collect::<String>()
                .chars()
                .rev()
                .collect();
            // The tail token of one segment reappears at the head of the next.
            let last_word = tail.split_whitespace().last().unwrap_or("");
            assert!(
                last_word.is_empty() || pair[1].contains(last_word),
                "expected overlap between {:?} and {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn every_segment_is_a_substring_of_the_input() {
        let text = "fn main() {\n    println!(\"hi\");\n}\n\nfn other() {\n    let x = 1;\n}\n";
        let rust: &[&str] = &["\nfn ", "\n\n", "\n", " ", ""];
        for segment in split_text(text, rust, 30, 5) {
            assert!(text.contains(&segment), "not a substring: {segment:?}");
        }
    }

    #[test]
    fn unbreakable_text_hard_splits() {
        let text = "x".repeat(95);
        let segments = split_text(&text, PLAIN, 40, 10);
        assert!(segments.len() >= 3);
        assert!(segments.iter().all(|s| s.chars().count() <= 40));
        // Hard split walks a fixed stride, so successive windows share 10 chars.
        assert_eq!(segments[0].chars().count(), 40);
    }

    #[test]
    fn empty_and_whitespace_input_yield_nothing() {
        assert!(split_text("", PLAIN, 100, 10).is_empty());
        assert!(split_text("   \n\n  ", PLAIN, 100, 10).is_empty());
    }

    #[test]
    fn unicode_counts_chars_not_bytes() {
        let text = "ü".repeat(30);
        let segments = split_text(&text, PLAIN, 10, 2);
        assert!(segments.iter().all(|s| s.chars().count() <= 10));
    }

    #[test]
    fn overlap_larger_than_size_is_clamped() {
        let text = "a b c d e f g h i j";
        let segments = split_text(text, PLAIN, 4, 100);
        assert!(!segments.is_empty());
        assert!(segments.iter().all(|s| s.chars().count() <= 4));
    }
}
