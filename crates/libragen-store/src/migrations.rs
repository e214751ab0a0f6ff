//! Schema migrations under a backup/restore envelope.
//!
//! Migrations are an append-only list of embedded SQL scripts indexed by a
//! monotonically increasing version; [`CURRENT_SCHEMA_VERSION`] is the
//! highest known version. On open, pending migrations run under an
//! envelope: the artifact is copied to `<path>.backup`, each migration
//! executes in its own transaction bumping `schema_version`, and any
//! failure deletes the partially-migrated file and moves the backup back
//! into place before the original error is rethrown.
//!
//! Migrations must be synchronous SQL: deterministic, no network, no user
//! input. Gaps in version numbers are rejected up front.

use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// Key in `library_meta` holding the schema version as a decimal string.
pub const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Key in `library_meta` holding the manifest JSON.
pub const MANIFEST_KEY: &str = "manifest";

/// One forward migration step.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Target schema version after this migration runs.
    pub version: i64,
    /// Human-readable description.
    pub description: &'static str,
    /// SQL batch to execute.
    pub sql: &'static str,
}

/// All known migrations, ascending.
pub static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "initial schema: chunks, chunks_fts, library_meta",
    sql: include_str!("../migrations/001_initial.sql"),
}];

/// Highest schema version this engine knows how to produce.
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Reject migration lists with gaps or out-of-order versions.
pub(crate) fn validate_migrations(migrations: &[Migration]) -> Result<(), StoreError> {
    let mut previous = 0;
    for migration in migrations {
        if migration.version != previous + 1 {
            return Err(StoreError::MigrationGap {
                previous,
                found: migration.version,
            });
        }
        previous = migration.version;
    }
    Ok(())
}

/// Read the stored schema version. A missing `library_meta` table or a
/// missing key both mean version 0 (pre-schema artifact).
pub(crate) async fn stored_schema_version(conn: &libsql::Connection) -> Result<i64, StoreError> {
    let rows = conn
        .query(
            "SELECT value FROM library_meta WHERE key = ?1",
            libsql::params![SCHEMA_VERSION_KEY],
        )
        .await;
    let mut rows = match rows {
        Ok(rows) => rows,
        // No table yet: the artifact predates the first migration.
        Err(_) => return Ok(0),
    };
    match rows.next().await? {
        Some(row) => {
            let raw: String = row.get(0)?;
            raw.parse::<i64>().map_err(|_| {
                StoreError::InvalidArtifact(format!("schema_version is not an integer: {raw}"))
            })
        }
        None => Ok(0),
    }
}

async fn write_schema_version(conn: &libsql::Connection, version: i64) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO library_meta (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        libsql::params![SCHEMA_VERSION_KEY, version.to_string()],
    )
    .await?;
    Ok(())
}

async fn open_connection(path: &Path) -> Result<(libsql::Database, libsql::Connection), StoreError> {
    let db = libsql::Builder::new_local(path).build().await?;
    let conn = db.connect()?;
    Ok((db, conn))
}

/// Apply every listed migration to a freshly created artifact, outside the
/// envelope (there is nothing to back up yet).
pub(crate) async fn apply_fresh(
    conn: &libsql::Connection,
    migrations: &[Migration],
) -> Result<(), StoreError> {
    validate_migrations(migrations)?;
    for migration in migrations {
        apply_one(conn, migration).await?;
    }
    Ok(())
}

/// Execute one migration in its own transaction and bump the version.
async fn apply_one(conn: &libsql::Connection, migration: &Migration) -> Result<(), StoreError> {
    conn.execute("BEGIN", ()).await?;
    let result = async {
        conn.execute_batch(migration.sql).await?;
        write_schema_version(conn, migration.version).await
    }
    .await;
    match result {
        Ok(()) => {
            conn.execute("COMMIT", ()).await?;
            tracing::debug!(
                version = migration.version,
                description = migration.description,
                "applied migration"
            );
            Ok(())
        }
        Err(e) => {
            let _ = conn.execute("ROLLBACK", ()).await;
            Err(StoreError::Migration {
                version: migration.version,
                message: e.to_string(),
            })
        }
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".backup");
    PathBuf::from(name)
}

/// Check an artifact for pending migrations without writing anything.
///
/// # Errors
///
/// - [`StoreError::SchemaVersion`] when the artifact is newer than this
///   engine.
/// - [`StoreError::MigrationRequired`] when the artifact is older and would
///   need a writable open to migrate.
pub async fn check_schema(path: &Path, migrations: &[Migration]) -> Result<(), StoreError> {
    validate_migrations(migrations)?;
    let current = migrations.last().map_or(0, |m| m.version);
    let (_db, conn) = open_connection(path).await?;
    let stored = stored_schema_version(&conn).await?;
    if stored > current {
        return Err(StoreError::SchemaVersion {
            required: stored,
            supported: current,
        });
    }
    if stored < current {
        return Err(StoreError::MigrationRequired { stored });
    }
    Ok(())
}

/// Bring an artifact up to the latest migration under the backup/restore
/// envelope. No-op when already current.
///
/// # Errors
///
/// - [`StoreError::SchemaVersion`] when the artifact is newer than this
///   engine.
/// - The original migration error after the backup has been restored.
pub async fn migrate(path: &Path, migrations: &[Migration]) -> Result<(), StoreError> {
    validate_migrations(migrations)?;
    let current = migrations.last().map_or(0, |m| m.version);

    let stored = {
        let (_db, conn) = open_connection(path).await?;
        stored_schema_version(&conn).await?
        // Handles drop here, closing the file before the backup copy.
    };

    if stored > current {
        return Err(StoreError::SchemaVersion {
            required: stored,
            supported: current,
        });
    }
    if stored == current {
        return Ok(());
    }

    let backup = backup_path(path);
    tokio::fs::copy(path, &backup).await?;

    let result = async {
        let (_db, conn) = open_connection(path).await?;
        for migration in migrations.iter().filter(|m| m.version > stored) {
            apply_one(&conn, migration).await?;
        }
        Ok::<(), StoreError>(())
    }
    .await;

    match result {
        Ok(()) => {
            tokio::fs::remove_file(&backup).await?;
            Ok(())
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(path).await;
            tokio::fs::rename(&backup, path).await?;
            tracing::warn!(error = %e, "migration failed, backup restored");
            Err(e)
        }
    }
}
