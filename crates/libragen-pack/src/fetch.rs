//! Fetching collection documents and library bytes.
//!
//! Sources are HTTP(S) URLs or local paths. Non-success HTTP statuses map
//! to [`PackError::Download`]; transport failures to [`PackError::Network`].
//! Downloads can be verified against an expected SHA-256.

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::PackError;

/// Whether a source string is an HTTP(S) URL.
#[must_use]
pub fn is_http_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Normalize a source URI for visited-set comparisons: backslashes become
/// slashes, trailing slashes are stripped.
#[must_use]
pub fn normalize_source(source: &str) -> String {
    source.replace('\\', "/").trim_end_matches('/').to_string()
}

/// Resolve `reference` against the document it was found in. Absolute URLs
/// and absolute paths pass through; relative references resolve against the
/// base's parent.
#[must_use]
pub fn resolve_relative(base: &str, reference: &str) -> String {
    if is_http_url(reference) || Path::new(reference).is_absolute() {
        return reference.to_string();
    }
    if is_http_url(base) {
        match reqwest::Url::parse(base).and_then(|url| url.join(reference)) {
            Ok(joined) => joined.to_string(),
            Err(_) => reference.to_string(),
        }
    } else {
        let parent = Path::new(base).parent().unwrap_or_else(|| Path::new(""));
        normalize_source(&parent.join(reference).to_string_lossy())
    }
}

/// Fetch raw bytes from an HTTP(S) URL or a local path.
///
/// # Errors
///
/// [`PackError::Download`] for non-2xx responses, [`PackError::Network`]
/// for transport failures, [`PackError::NotFound`] for missing local files.
pub async fn fetch_bytes(source: &str) -> Result<Vec<u8>, PackError> {
    if is_http_url(source) {
        let response = reqwest::get(source).await?;
        if !response.status().is_success() {
            return Err(PackError::Download {
                status: response.status().as_u16(),
                url: source.to_string(),
            });
        }
        return Ok(response.bytes().await?.to_vec());
    }
    match tokio::fs::read(source).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PackError::NotFound(source.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Verify bytes against an expected hex SHA-256 (with or without a
/// `sha256:` prefix).
///
/// # Errors
///
/// Returns [`PackError::Integrity`] on mismatch.
pub fn verify_sha256(bytes: &[u8], expected: &str) -> Result<(), PackError> {
    let expected_hex = expected
        .strip_prefix("sha256:")
        .unwrap_or(expected)
        .to_lowercase();
    let actual = format!("{:x}", Sha256::digest(bytes));
    if actual == expected_hex {
        Ok(())
    } else {
        Err(PackError::Integrity {
            expected: expected_hex,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn http_detection() {
        assert!(is_http_url("https://example.com/c.json"));
        assert!(is_http_url("http://localhost:8080/c.json"));
        assert!(!is_http_url("./local/c.json"));
        assert!(!is_http_url("/abs/c.json"));
    }

    #[test]
    fn normalization_strips_trailing_slash_and_backslashes() {
        assert_eq!(
            normalize_source("https://example.com/c/"),
            "https://example.com/c"
        );
        assert_eq!(normalize_source("a\\b\\c"), "a/b/c");
    }

    #[test]
    fn relative_http_reference_joins_base() {
        assert_eq!(
            resolve_relative("https://example.com/packs/main.json", "./child.json"),
            "https://example.com/packs/child.json"
        );
        assert_eq!(
            resolve_relative("https://example.com/packs/main.json", "libs/x.libragen"),
            "https://example.com/packs/libs/x.libragen"
        );
    }

    #[test]
    fn relative_file_reference_joins_parent() {
        assert_eq!(
            resolve_relative("/data/packs/main.json", "child.json"),
            "/data/packs/child.json"
        );
    }

    #[test]
    fn absolute_references_pass_through() {
        assert_eq!(
            resolve_relative("/data/main.json", "https://example.com/x.json"),
            "https://example.com/x.json"
        );
        assert_eq!(resolve_relative("/data/main.json", "/other/x.json"), "/other/x.json");
    }

    #[test]
    fn sha256_accepts_prefixed_and_bare() {
        let digest = format!("{:x}", Sha256::digest(b"payload"));
        verify_sha256(b"payload", &digest).unwrap();
        verify_sha256(b"payload", &format!("sha256:{digest}")).unwrap();
    }

    #[test]
    fn sha256_mismatch_is_integrity_error() {
        let err = verify_sha256(b"payload", "sha256:deadbeef").unwrap_err();
        assert!(matches!(err, PackError::Integrity { .. }));
    }

    #[tokio::test]
    async fn missing_local_file_is_not_found() {
        let err = fetch_bytes("/no/such/file.libragen").await.unwrap_err();
        assert!(matches!(err, PackError::NotFound(_)));
    }

    #[tokio::test]
    async fn local_file_bytes_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        std::fs::write(&path, b"hello bytes").unwrap();
        let bytes = fetch_bytes(&path.to_string_lossy()).await.unwrap();
        assert_eq!(bytes, b"hello bytes");
    }
}
