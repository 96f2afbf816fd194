//! SQLite-backed snapshot store.
//!
//! One row per identity. `put` is a single upsert statement, so SQLite's own
//! transaction guarantees cover atomicity.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

use super::{Snapshot, SnapshotStore};
use crate::error::{StoreError, StoreResult};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS snapshots (
        identity TEXT PRIMARY KEY,
        storage_key TEXT NOT NULL,
        content_hash TEXT NOT NULL,
        normalized_text TEXT NOT NULL,
        last_seen_at TEXT NOT NULL
    );
"#;

/// SQLite snapshot store.
pub struct SqliteSnapshotStore {
    conn: Mutex<Connection>,
    location: String,
}

impl SqliteSnapshotStore {
    /// Open or create the database file.
    pub fn open(db_path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn, db_path.display().to_string())
    }

    /// Private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, ":memory:".to_string())
    }

    fn with_connection(conn: Connection, location: String) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            location,
        })
    }

    /// Number of stored snapshots.
    pub fn count(&self) -> StoreResult<usize> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM snapshots", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn get(&self, identity: &str) -> StoreResult<Option<Snapshot>> {
        let identity = identity.trim();
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;

        let row = conn
            .query_row(
                "SELECT content_hash, normalized_text, last_seen_at FROM snapshots WHERE identity = ?1",
                params![identity],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((content_hash, normalized_text, last_seen_at)) = row else {
            return Ok(None);
        };

        let last_seen_at = DateTime::parse_from_rfc3339(&last_seen_at)
            .map_err(|e| StoreError::Corrupt {
                key: identity.to_string(),
                reason: format!("bad last_seen_at '{last_seen_at}': {e}"),
            })?
            .with_timezone(&Utc);

        Ok(Some(Snapshot {
            identity: identity.to_string(),
            content_hash,
            normalized_text,
            last_seen_at,
        }))
    }

    fn put(
        &self,
        identity: &str,
        content_hash: &str,
        normalized_text: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let identity = identity.trim();
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;

        conn.execute(
            r#"
            INSERT INTO snapshots (identity, storage_key, content_hash, normalized_text, last_seen_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(identity) DO UPDATE SET
                content_hash = excluded.content_hash,
                normalized_text = excluded.normalized_text,
                last_seen_at = excluded.last_seen_at
            "#,
            params![
                identity,
                crate::fingerprint::storage_key(identity),
                content_hash,
                normalized_text,
                now.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    fn describe_key(&self, identity: &str) -> String {
        format!("{}#snapshots/{}", self.location, identity.trim())
    }
}
