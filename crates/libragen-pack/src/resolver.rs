//! Collection resolution.
//!
//! A collection is a JSON document listing libraries and nested
//! collections. Resolution walks the tree depth-first with a visited set
//! keyed by normalized source URI (cycles are legal and broken there), a
//! depth limit, and merge semantics: a library reached from several
//! collections keeps one entry with the union of its `fromCollections` and
//! an OR of its `required` flags.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::PackError;
use crate::fetch::{fetch_bytes, normalize_source, resolve_relative};

/// Default nesting limit.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// A collection document as fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDoc {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub items: Vec<CollectionItem>,
}

/// One item: a library reference or a nested collection reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    /// Defaults to required when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Optional expected SHA-256 of the library bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// A library after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLibrary {
    /// Name derived from the source URI.
    pub name: String,
    /// Absolute source URI.
    pub source: String,
    /// True when any appearance was required.
    pub required: bool,
    /// Collections that reference this library, in encounter order.
    pub from_collections: Vec<String>,
    /// Expected SHA-256, from the first item that carried one.
    pub sha256: Option<String>,
}

/// The outcome of resolving a collection tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCollection {
    /// Root collection name.
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
    /// All libraries, in encounter order (`required ∪ optional`).
    pub libraries: Vec<ResolvedLibrary>,
    /// Collection names in traversal order, root first, each once.
    pub collections: Vec<String>,
}

impl ResolvedCollection {
    /// Libraries with `required = true`.
    #[must_use]
    pub fn required(&self) -> Vec<&ResolvedLibrary> {
        self.libraries.iter().filter(|l| l.required).collect()
    }

    /// Libraries with `required = false`.
    #[must_use]
    pub fn optional(&self) -> Vec<&ResolvedLibrary> {
        self.libraries.iter().filter(|l| !l.required).collect()
    }
}

/// Options for [`resolve`].
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Selection hint for installers; traversal always resolves both sets.
    pub include_optional: bool,
    /// Maximum nesting depth.
    pub max_depth: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            include_optional: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Derive a library name from its source URI: strip query/fragment, take
/// the final path component, drop a `.libragen` or `.json` extension.
#[must_use]
pub fn library_name_from_source(source: &str) -> String {
    let without_query = source
        .split_once('?')
        .map_or(source, |(head, _)| head);
    let without_fragment = without_query
        .split_once('#')
        .map_or(without_query, |(head, _)| head);
    let last = without_fragment
        .trim_end_matches('/')
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(without_fragment);
    last.trim_end_matches(".libragen")
        .trim_end_matches(".json")
        .to_string()
}

struct ResolveState {
    visited: HashSet<String>,
    libraries: Vec<ResolvedLibrary>,
    index_by_name: HashMap<String, usize>,
    collections: Vec<String>,
}

/// Fetch and parse one collection document.
async fn load_collection(source: &str) -> Result<CollectionDoc, PackError> {
    let bytes = fetch_bytes(source).await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| PackError::InvalidCollection(format!("{source}: {e}")))
}

/// Resolve the collection tree rooted at `source`.
///
/// # Errors
///
/// [`PackError::DepthExceeded`] past `max_depth`,
/// [`PackError::InvalidCollection`] for malformed documents, plus fetch
/// errors.
pub async fn resolve(
    source: &str,
    options: &ResolveOptions,
) -> Result<ResolvedCollection, PackError> {
    let mut state = ResolveState {
        visited: HashSet::new(),
        libraries: Vec::new(),
        index_by_name: HashMap::new(),
        collections: Vec::new(),
    };
    let root = load_collection(source).await?;
    let root_name = root.name.clone();
    let root_version = root.version.clone();
    let root_description = root.description.clone();

    state.visited.insert(normalize_source(source));
    resolve_into(root, source.to_string(), 0, options, &mut state).await?;

    Ok(ResolvedCollection {
        name: root_name,
        version: root_version,
        description: root_description,
        libraries: state.libraries,
        collections: state.collections,
    })
}

/// Walk one collection document. Boxed recursion keeps the future sized.
fn resolve_into<'a>(
    doc: CollectionDoc,
    source: String,
    depth: usize,
    options: &'a ResolveOptions,
    state: &'a mut ResolveState,
) -> std::pin::Pin<Box<dyn Future<Output = Result<(), PackError>> + Send + 'a>> {
    Box::pin(async move {
        if depth > options.max_depth {
            return Err(PackError::DepthExceeded {
                max: options.max_depth,
            });
        }
        if !state.collections.iter().any(|name| *name == doc.name) {
            state.collections.push(doc.name.clone());
        }

        for item in doc.items {
            match (&item.library, &item.collection) {
                (Some(library), None) => {
                    let resolved_source = resolve_relative(&source, library);
                    let name = library_name_from_source(&resolved_source);
                    let required = item.required.unwrap_or(true);
                    merge_library(state, &doc.name, name, resolved_source, required, item.sha256);
                }
                (None, Some(collection)) => {
                    let resolved_source = resolve_relative(&source, collection);
                    let key = normalize_source(&resolved_source);
                    if !state.visited.insert(key) {
                        continue;
                    }
                    let child = load_collection(&resolved_source).await?;
                    resolve_into(child, resolved_source, depth + 1, options, state).await?;
                }
                _ => {
                    return Err(PackError::InvalidCollection(format!(
                        "{source}: each item needs exactly one of 'library' or 'collection'"
                    )));
                }
            }
        }
        Ok(())
    })
}

fn merge_library(
    state: &mut ResolveState,
    collection_name: &str,
    name: String,
    source: String,
    required: bool,
    sha256: Option<String>,
) {
    if let Some(&index) = state.index_by_name.get(&name) {
        let existing = &mut state.libraries[index];
        existing.required |= required;
        if !existing
            .from_collections
            .iter()
            .any(|c| c == collection_name)
        {
            existing.from_collections.push(collection_name.to_string());
        }
        if existing.sha256.is_none() {
            existing.sha256 = sha256;
        }
        return;
    }
    state.index_by_name.insert(name.clone(), state.libraries.len());
    state.libraries.push(ResolvedLibrary {
        name,
        source,
        required,
        from_collections: vec![collection_name.to_string()],
        sha256,
    });
}
