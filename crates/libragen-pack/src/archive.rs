//! Packed collection archives (`*.libragen-collection`).
//!
//! A packed collection is a gzip-compressed tar archive holding
//! `collection.json` plus one `.libragen` file per library. Packing
//! resolves the collection tree to a flat library list and rewrites every
//! library reference to `./<filename>`, so the archive is installable with
//! no network access. Install extracts to a scratch directory and installs
//! `collection.json` from there.

use std::io::Write;
use std::path::Path;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tempfile::TempDir;

use crate::error::PackError;
use crate::fetch::fetch_bytes;
use crate::resolver::{CollectionDoc, CollectionItem, ResolveOptions, resolve};

/// Name of the collection document inside an archive.
pub const ARCHIVE_COLLECTION_FILE: &str = "collection.json";

fn tar_header(size: u64) -> tar::Header {
    let mut header = tar::Header::new_gnu();
    header.set_size(size);
    header.set_mode(0o644);
    header.set_cksum();
    header
}

/// Pack the collection at `source` (path or URL) into `output`.
///
/// The full tree is resolved first; nested collections flatten into one
/// document whose items all point at bundled files.
///
/// # Errors
///
/// Propagates resolve and fetch failures; [`PackError::Io`] on archive
/// write failure.
pub async fn pack_collection(source: &str, output: &Path) -> Result<(), PackError> {
    let resolved = resolve(source, &ResolveOptions::default()).await?;

    let mut entries: Vec<(String, Vec<u8>)> = Vec::new();
    let mut items = Vec::new();
    for library in &resolved.libraries {
        let filename = format!("{}.libragen", library.name);
        let bytes = fetch_bytes(&library.source).await?;
        items.push(CollectionItem {
            library: Some(format!("./{filename}")),
            collection: None,
            required: Some(library.required),
            sha256: library.sha256.clone(),
        });
        entries.push((filename, bytes));
    }

    let doc = CollectionDoc {
        name: resolved.name,
        version: resolved.version,
        description: resolved.description,
        items,
    };
    let doc_bytes = serde_json::to_vec_pretty(&doc)?;

    let file = std::fs::File::create(output)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    let mut header = tar_header(doc_bytes.len() as u64);
    builder.append_data(&mut header, ARCHIVE_COLLECTION_FILE, doc_bytes.as_slice())?;
    for (filename, bytes) in &entries {
        let mut header = tar_header(bytes.len() as u64);
        builder.append_data(&mut header, filename, bytes.as_slice())?;
    }
    builder.into_inner()?.finish()?.flush()?;
    Ok(())
}

/// Extract a packed collection into a scratch directory.
///
/// The returned directory owns the extracted tree; dropping it removes
/// everything.
///
/// # Errors
///
/// [`PackError::Io`] on read/extract failure and
/// [`PackError::InvalidCollection`] when `collection.json` is absent.
pub fn unpack_collection(archive_path: &Path) -> Result<TempDir, PackError> {
    let scratch = TempDir::new()?;
    let file = std::fs::File::open(archive_path)?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    archive.unpack(scratch.path())?;

    if !scratch.path().join(ARCHIVE_COLLECTION_FILE).is_file() {
        return Err(PackError::InvalidCollection(format!(
            "{} has no {ARCHIVE_COLLECTION_FILE}",
            archive_path.display()
        )));
    }
    Ok(scratch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn pack_then_unpack_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("alpha.libragen"), b"alpha-bytes").unwrap();
        std::fs::write(dir.path().join("beta.libragen"), b"beta-bytes").unwrap();
        let collection = serde_json::json!({
            "name": "bundle",
            "version": "1.2.3",
            "items": [
                { "library": "./alpha.libragen" },
                { "library": "./beta.libragen", "required": false },
            ],
        });
        let source = dir.path().join("bundle.json");
        std::fs::write(&source, serde_json::to_vec(&collection).unwrap()).unwrap();

        let archive = dir.path().join("bundle.libragen-collection");
        pack_collection(&source.to_string_lossy(), &archive)
            .await
            .unwrap();

        let scratch = unpack_collection(&archive).unwrap();
        let doc: CollectionDoc = serde_json::from_slice(
            &std::fs::read(scratch.path().join(ARCHIVE_COLLECTION_FILE)).unwrap(),
        )
        .unwrap();
        assert_eq!(doc.name, "bundle");
        assert_eq!(doc.version.as_deref(), Some("1.2.3"));
        assert_eq!(doc.items.len(), 2);
        assert_eq!(doc.items[0].library.as_deref(), Some("./alpha.libragen"));
        assert_eq!(doc.items[1].required, Some(false));

        assert_eq!(
            std::fs::read(scratch.path().join("alpha.libragen")).unwrap(),
            b"alpha-bytes"
        );
        assert_eq!(
            std::fs::read(scratch.path().join("beta.libragen")).unwrap(),
            b"beta-bytes"
        );
    }

    #[tokio::test]
    async fn nested_collections_flatten_into_the_archive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("inner.libragen"), b"inner").unwrap();
        std::fs::write(dir.path().join("outer.libragen"), b"outer").unwrap();
        std::fs::write(
            dir.path().join("child.json"),
            serde_json::to_vec(&serde_json::json!({
                "name": "child",
                "items": [{ "library": "./inner.libragen" }],
            }))
            .unwrap(),
        )
        .unwrap();
        let source = dir.path().join("parent.json");
        std::fs::write(
            &source,
            serde_json::to_vec(&serde_json::json!({
                "name": "parent",
                "items": [
                    { "library": "./outer.libragen" },
                    { "collection": "./child.json" },
                ],
            }))
            .unwrap(),
        )
        .unwrap();

        let archive = dir.path().join("parent.libragen-collection");
        pack_collection(&source.to_string_lossy(), &archive)
            .await
            .unwrap();

        let scratch = unpack_collection(&archive).unwrap();
        let doc: CollectionDoc = serde_json::from_slice(
            &std::fs::read(scratch.path().join(ARCHIVE_COLLECTION_FILE)).unwrap(),
        )
        .unwrap();
        // Both libraries bundled, no collection items left.
        assert_eq!(doc.items.len(), 2);
        assert!(doc.items.iter().all(|i| i.collection.is_none()));
        assert!(scratch.path().join("inner.libragen").is_file());
    }

    #[test]
    fn archive_without_collection_json_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("bad.libragen-collection");
        let file = std::fs::File::create(&archive).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let mut header = tar_header(4);
        builder
            .append_data(&mut header, "something.txt", b"data".as_slice())
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let err = unpack_collection(&archive).unwrap_err();
        assert!(matches!(err, PackError::InvalidCollection(_)));
    }
}
