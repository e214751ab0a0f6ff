//! File source adapter.
//!
//! Walks one or more roots with the `ignore` crate in raw mode (no
//! gitignore semantics; indexing wants complete coverage) and filters with
//! include/exclude globs. A built-in default exclude set covers common
//! build, vendor, and lockfile paths and is merged with caller exclusions
//! unless explicitly disabled.
//!
//! Files that exceed the size limit, fail to read, or are not valid UTF-8
//! are skipped with a warning rather than failing the walk.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ignore::WalkBuilder;
use ignore::overrides::OverrideBuilder;

use crate::error::SourceError;

/// Default maximum file size: 1 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Built-in exclusions: build output, vendored deps, lockfiles, VCS state.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".git/**",
    ".hg/**",
    ".svn/**",
    "node_modules/**",
    "target/**",
    "dist/**",
    "build/**",
    "out/**",
    "vendor/**",
    "__pycache__/**",
    ".venv/**",
    "venv/**",
    ".idea/**",
    ".vscode/**",
    "coverage/**",
    "*.lock",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "*.min.js",
    "*.min.css",
    ".DS_Store",
];

/// One file read from a source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to the walk root, with forward slashes.
    pub relative_path: String,
    /// Full UTF-8 content.
    pub content: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, when the filesystem reports one.
    pub modified_at: Option<DateTime<Utc>>,
}

/// Options for the file walker.
#[derive(Debug, Clone)]
pub struct FileAdapterOptions {
    /// Include globs; empty means include everything.
    pub include: Vec<String>,
    /// Exclude globs, merged with [`DEFAULT_EXCLUDES`] unless disabled.
    pub exclude: Vec<String>,
    /// Whether the built-in exclude set applies.
    pub use_default_excludes: bool,
    /// Files larger than this are skipped.
    pub max_file_size: u64,
}

impl Default for FileAdapterOptions {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            use_default_excludes: true,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

fn build_overrides(
    root: &Path,
    options: &FileAdapterOptions,
) -> Result<ignore::overrides::Override, SourceError> {
    let mut overrides = OverrideBuilder::new(root);
    let invalid = |pattern: &str, e: ignore::Error| SourceError::InvalidGlob {
        pattern: pattern.to_string(),
        message: e.to_string(),
    };

    for glob in &options.include {
        overrides.add(glob).map_err(|e| invalid(glob, e))?;
    }
    let mut excludes: Vec<&str> = options.exclude.iter().map(String::as_str).collect();
    if options.use_default_excludes {
        excludes.extend_from_slice(DEFAULT_EXCLUDES);
    }
    for glob in excludes {
        let negated = format!("!{glob}");
        overrides.add(&negated).map_err(|e| invalid(glob, e))?;
    }
    overrides.build().map_err(|e| SourceError::InvalidGlob {
        pattern: "<combined>".to_string(),
        message: e.to_string(),
    })
}

/// Collect readable UTF-8 files under `root` (a directory or a single file).
///
/// Results are ordered by relative path so builds are deterministic.
///
/// # Errors
///
/// [`SourceError::NotFound`] when `root` does not exist and
/// [`SourceError::InvalidGlob`] for unparseable patterns. Per-file read
/// failures are skipped, not errors.
pub async fn collect_files(
    root: &Path,
    options: &FileAdapterOptions,
) -> Result<Vec<SourceFile>, SourceError> {
    if !root.exists() {
        return Err(SourceError::NotFound(root.to_path_buf()));
    }

    if root.is_file() {
        let parent = root.parent().unwrap_or(Path::new("")).to_path_buf();
        let mut files = Vec::new();
        if let Some(file) = read_source_file(root, &parent, options.max_file_size).await {
            files.push(file);
        }
        return Ok(files);
    }

    let overrides = build_overrides(root, options)?;
    let mut builder = WalkBuilder::new(root);
    builder.standard_filters(false);
    builder.hidden(false);
    builder.overrides(overrides);

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in builder.build() {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_some_and(|ft| ft.is_file()) {
                    paths.push(entry.path().to_path_buf());
                }
            }
            Err(e) => tracing::warn!(error = %e, "walk entry skipped"),
        }
    }
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        if let Some(file) = read_source_file(&path, root, options.max_file_size).await {
            files.push(file);
        }
    }
    Ok(files)
}

/// Read one file into a [`SourceFile`]; `None` when skipped (too large,
/// unreadable, or not UTF-8).
async fn read_source_file(path: &Path, root: &Path, max_size: u64) -> Option<SourceFile> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "stat failed, file skipped");
            return None;
        }
    };
    if metadata.len() > max_size {
        tracing::warn!(
            path = %path.display(),
            size = metadata.len(),
            "file exceeds size limit, skipped"
        );
        return None;
    }

    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "read failed, file skipped");
            return None;
        }
    };
    let Ok(content) = String::from_utf8(bytes) else {
        tracing::debug!(path = %path.display(), "not UTF-8, file skipped");
        return None;
    };

    let relative_path = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/");

    Some(SourceFile {
        path: path.to_path_buf(),
        relative_path,
        size: metadata.len(),
        modified_at: metadata.modified().ok().map(DateTime::<Utc>::from),
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for sub in ["src", "docs", "node_modules/lodash", "target/debug"] {
            std::fs::create_dir_all(dir.path().join(sub)).unwrap();
        }
        let files = [
            ("src/lib.rs", "pub fn lib() {}"),
            ("src/main.rs", "fn main() {}"),
            ("docs/guide.md", "# Guide"),
            ("README.md", "# Readme"),
            ("Cargo.lock", "[[package]]"),
            ("node_modules/lodash/index.js", "module.exports = {};"),
            ("target/debug/out.txt", "artifacts"),
        ];
        for (path, content) in files {
            std::fs::write(dir.path().join(path), content).unwrap();
        }
        dir
    }

    fn relative_paths(files: &[SourceFile]) -> Vec<&str> {
        files.iter().map(|f| f.relative_path.as_str()).collect()
    }

    #[tokio::test]
    async fn default_excludes_filter_vendor_and_lockfiles() {
        let dir = fixture().await;
        let files = collect_files(dir.path(), &FileAdapterOptions::default())
            .await
            .unwrap();
        let paths = relative_paths(&files);
        assert_eq!(
            paths,
            vec!["README.md", "docs/guide.md", "src/lib.rs", "src/main.rs"]
        );
    }

    #[tokio::test]
    async fn disabling_default_excludes_walks_everything() {
        let dir = fixture().await;
        let options = FileAdapterOptions {
            use_default_excludes: false,
            ..Default::default()
        };
        let files = collect_files(dir.path(), &options).await.unwrap();
        let paths = relative_paths(&files);
        assert!(paths.contains(&"node_modules/lodash/index.js"));
        assert!(paths.contains(&"Cargo.lock"));
    }

    #[tokio::test]
    async fn include_globs_whitelist() {
        let dir = fixture().await;
        let options = FileAdapterOptions {
            include: vec!["**/*.rs".to_string()],
            ..Default::default()
        };
        let files = collect_files(dir.path(), &options).await.unwrap();
        assert_eq!(relative_paths(&files), vec!["src/lib.rs", "src/main.rs"]);
    }

    #[tokio::test]
    async fn caller_excludes_merge_with_defaults() {
        let dir = fixture().await;
        let options = FileAdapterOptions {
            exclude: vec!["docs/**".to_string()],
            ..Default::default()
        };
        let files = collect_files(dir.path(), &options).await.unwrap();
        let paths = relative_paths(&files);
        assert!(!paths.contains(&"docs/guide.md"));
        assert!(!paths.contains(&"node_modules/lodash/index.js"));
        assert!(paths.contains(&"README.md"));
    }

    #[tokio::test]
    async fn oversized_files_are_skipped() {
        let dir = fixture().await;
        let options = FileAdapterOptions {
            max_file_size: 10,
            ..Default::default()
        };
        let files = collect_files(dir.path(), &options).await.unwrap();
        let paths = relative_paths(&files);
        assert!(paths.contains(&"docs/guide.md"), "7 bytes, kept");
        assert!(!paths.contains(&"src/lib.rs"), "15 bytes, skipped");
    }

    #[tokio::test]
    async fn binary_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data.txt"), [0xff, 0xfe, 0x00, 0x41]).unwrap();
        std::fs::write(dir.path().join("ok.txt"), "text").unwrap();
        let files = collect_files(dir.path(), &FileAdapterOptions::default())
            .await
            .unwrap();
        assert_eq!(relative_paths(&files), vec!["ok.txt"]);
    }

    #[tokio::test]
    async fn single_file_root_yields_one_entry() {
        let dir = fixture().await;
        let files = collect_files(
            &dir.path().join("README.md"),
            &FileAdapterOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "README.md");
        assert_eq!(files[0].content, "# Readme");
    }

    #[tokio::test]
    async fn missing_root_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = collect_files(&dir.path().join("gone"), &FileAdapterOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }

    #[tokio::test]
    async fn bad_glob_is_reported() {
        let dir = fixture().await;
        let options = FileAdapterOptions {
            include: vec!["{unclosed".to_string()],
            ..Default::default()
        };
        let err = collect_files(dir.path(), &options).await.unwrap_err();
        assert!(matches!(err, SourceError::InvalidGlob { .. }));
    }
}
