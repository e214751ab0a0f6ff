//! Output path resolution for built artifacts.

use std::path::{Path, PathBuf};

use libragen_core::home::{LIBRARY_EXTENSION, is_library_path};

fn artifact_filename(name: &str, version: &str) -> String {
    if version.is_empty() {
        format!("{name}.{LIBRARY_EXTENSION}")
    } else {
        format!("{name}-{version}.{LIBRARY_EXTENSION}")
    }
}

/// Resolve where the artifact lands:
///
/// - an explicit path ending in `.libragen` is used directly;
/// - an explicit directory (existing or not) receives
///   `<name>-<version>.libragen` inside it;
/// - with no explicit output, git sources default to the platform temp
///   directory, local sources to the current directory.
#[must_use]
pub fn resolve_output_path(
    output: Option<&Path>,
    name: &str,
    version: &str,
    is_git_source: bool,
) -> PathBuf {
    let filename = artifact_filename(name, version);
    match output {
        Some(path) if is_library_path(path) => path.to_path_buf(),
        Some(path) => path.join(filename),
        None if is_git_source => std::env::temp_dir().join(filename),
        None => PathBuf::from(filename),
    }
}
