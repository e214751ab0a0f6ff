//! # libragen-core
//!
//! Shared types for the libragen library-artifact toolchain.
//!
//! Holds the chunk and manifest data model, the `Embedder`/`Reranker`
//! collaborator traits, and the resolution of the libragen home directory
//! layout. Domain errors live in their respective crates; this crate stays
//! dependency-light so every other crate can build on it.

pub mod chunk;
pub mod embedder;
pub mod home;
pub mod manifest;
pub mod test_support;

pub use chunk::{Chunk, SourceType, StoredChunk};
pub use embedder::{Embedder, NoReranker, Reranker};
pub use home::LibragenHome;
pub use manifest::{
    ChunkingConfig, ContentVersionType, EmbeddingConfig, LibraryManifest, LibraryStats,
    SourceProvenance,
};
