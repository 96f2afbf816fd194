//! Snapshot storage: the last-known normalized content of each document.
//!
//! The store is the only shared mutable state of the engine. Every backend offers the
//! same contract:
//!
//! - `get` returns `Ok(None)` only when the record is confirmed absent. Any other
//!   failure is an error.
//! - `put` replaces or creates the record atomically. A failed `put` leaves the previous
//!   record readable.
//!
//! ```text
//!                    ┌─────────────────────┐
//! ChangeDetector ──▶ │ dyn SnapshotStore   │
//!                    └──────────┬──────────┘
//!          ┌────────────────────┼────────────────────┐
//!          ▼                    ▼                    ▼
//!  FileSnapshotStore   SqliteSnapshotStore   MemorySnapshotStore
//!  (<key>.json files)  (snapshots.db)        (tests, dry runs)
//! ```

mod file;
mod memory;
mod sqlite;

pub use file::FileSnapshotStore;
pub use memory::MemorySnapshotStore;
pub use sqlite::SqliteSnapshotStore;

use chrono::{DateTime, Utc};
use rulewatch_common::StoreConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::error::{StoreError, StoreResult};

/// File name of the SQLite database inside the state directory.
pub const SQLITE_FILE_NAME: &str = "snapshots.db";

/// Persisted state for one document identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub identity: String,
    /// Hex SHA-256 of `normalized_text`
    pub content_hash: String,
    pub normalized_text: String,
    pub last_seen_at: DateTime<Utc>,
}

/// Key-value snapshot storage keyed by document identity.
pub trait SnapshotStore: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Fetch the snapshot for an identity.
    fn get(&self, identity: &str) -> StoreResult<Option<Snapshot>>;

    /// Atomically replace or create the snapshot for an identity.
    fn put(
        &self,
        identity: &str,
        content_hash: &str,
        normalized_text: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Where the record for an identity lives, for operators.
    fn describe_key(&self, identity: &str) -> String {
        crate::fingerprint::storage_key(identity)
    }
}

/// Open the backend selected in the store configuration.
pub fn open_store(config: &StoreConfig) -> StoreResult<Arc<dyn SnapshotStore>> {
    let path = Path::new(&config.path);
    let store: Arc<dyn SnapshotStore> = match config.backend.as_str() {
        "file" => Arc::new(FileSnapshotStore::open(path)?),
        "sqlite" => {
            std::fs::create_dir_all(path)
                .map_err(|e| StoreError::io(path.display().to_string(), e))?;
            Arc::new(SqliteSnapshotStore::open(&path.join(SQLITE_FILE_NAME))?)
        }
        "memory" => Arc::new(MemorySnapshotStore::new()),
        other => return Err(StoreError::UnsupportedBackend(other.to_string())),
    };

    tracing::info!(backend = store.name(), path = %config.path, "Snapshot store opened");
    Ok(store)
}
