//! # libragen-pack
//!
//! Package management for library artifacts: installing `.libragen` files
//! and collections (possibly nested, possibly cyclic) into per-project and
//! per-user library directories, with a reference-counted persistent
//! manifest deciding when files leave the disk.

pub mod archive;
pub mod error;
pub mod fetch;
pub mod manager;
pub mod manifest;
pub mod resolver;

pub use archive::{pack_collection, unpack_collection};
pub use error::PackError;
pub use manager::{
    CollectionInstallOptions, CollectionInstallReport, InstallOptions, InstalledLibrary,
    LibraryLocation, LibraryManager, ManagerOptions,
};
pub use manifest::{InstallManifest, InstalledCollection, InstalledLibraryRecord};
pub use resolver::{
    CollectionDoc, CollectionItem, DEFAULT_MAX_DEPTH, ResolveOptions, ResolvedCollection,
    ResolvedLibrary, resolve,
};
