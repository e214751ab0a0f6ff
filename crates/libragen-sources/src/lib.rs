//! # libragen-sources
//!
//! Source adapters feeding the indexer: a glob-filtered file walker, a git
//! adapter for remote clones and local working copies, and a license
//! detector. Adapters skip unreadable inputs with a warning; hard failures
//! are reserved for missing roots and failed clones.

pub mod error;
pub mod files;
pub mod git;
pub mod license;

pub use error::SourceError;
pub use files::{DEFAULT_EXCLUDES, DEFAULT_MAX_FILE_SIZE, FileAdapterOptions, SourceFile, collect_files};
pub use git::{
    GitFetchOptions, GitWorkingCopy, ParsedGitUrl, custom_host_from_env, fetch, is_git_url,
    parse_git_url, resolve_auth_token,
};
pub use license::{DetectedLicense, LicenseConfidence, classify_license_text, detect_license};
