//! One JSON record per identity under a state directory.
//!
//! Writes go to a uniquely named temp file in the same directory, are synced, then
//! renamed over the target. Rename within a directory is atomic, so a reader sees either
//! the old record or the new one. Temp files left behind by a crash are swept on open
//! once they are old enough that no live writer can still own them.

use chrono::{DateTime, Utc};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::{Snapshot, SnapshotStore};
use crate::error::{StoreError, StoreResult};
use crate::fingerprint::storage_key;

const TEMP_PREFIX: &str = ".snapshot-";
const TEMP_SUFFIX: &str = ".tmp";
const RECORD_EXTENSION: &str = "json";

/// Temp files younger than this may belong to another process mid-write.
const STALE_TEMP_AGE: Duration = Duration::from_secs(15 * 60);

/// Flat-file snapshot store.
#[derive(Debug)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    /// Open (creating if needed) the state directory and sweep crash residue.
    pub fn open(dir: &Path) -> StoreResult<Self> {
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir.display().to_string(), e))?;
        let store = Self {
            dir: dir.to_path_buf(),
        };
        let swept = store.sweep_temp_files(STALE_TEMP_AGE)?;
        if swept > 0 {
            tracing::warn!(count = swept, dir = %dir.display(), "Removed temp files from interrupted writes");
        }
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for an identity.
    pub fn record_path(&self, identity: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{RECORD_EXTENSION}", storage_key(identity)))
    }

    /// Remove temp files last modified at least `min_age` ago.
    fn sweep_temp_files(&self, min_age: Duration) -> StoreResult<usize> {
        let entries =
            fs::read_dir(&self.dir).map_err(|e| StoreError::io(self.dir.display().to_string(), e))?;
        let now = SystemTime::now();

        let mut removed = 0;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !(name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)) {
                continue;
            }
            let age = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .ok()
                .and_then(|modified| now.duration_since(modified).ok());
            // Unknown or future mtimes are left alone.
            if !age.is_some_and(|age| age >= min_age) {
                continue;
            }
            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::warn!(file = %name, error = %e, "Failed to remove stale temp file");
                }
            }
        }
        Ok(removed)
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn name(&self) -> &str {
        "file"
    }

    fn get(&self, identity: &str) -> StoreResult<Option<Snapshot>> {
        let key = storage_key(identity);
        let path = self.record_path(identity);

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(key, e)),
        };

        let snapshot: Snapshot = serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
            key: key.clone(),
            reason: e.to_string(),
        })?;

        if snapshot.identity != identity.trim() {
            return Err(StoreError::KeyCollision {
                key,
                expected: identity.trim().to_string(),
                found: snapshot.identity,
            });
        }

        Ok(Some(snapshot))
    }

    fn put(
        &self,
        identity: &str,
        content_hash: &str,
        normalized_text: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let key = storage_key(identity);
        let snapshot = Snapshot {
            identity: identity.trim().to_string(),
            content_hash: content_hash.to_string(),
            normalized_text: normalized_text.to_string(),
            last_seen_at: now,
        };
        let body = serde_json::to_vec_pretty(&snapshot)?;

        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(&self.dir)
            .map_err(|e| StoreError::io(key.as_str(), e))?;

        temp.write_all(&body)
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| StoreError::io(key.as_str(), e))?;

        // On failure the temp file is dropped (and deleted); the old record is untouched.
        temp.persist(self.record_path(identity))
            .map_err(|e| StoreError::io(key.as_str(), e.error))?;

        tracing::debug!(identity = %identity, key = %key, "Snapshot written");
        Ok(())
    }

    fn describe_key(&self, identity: &str) -> String {
        self.record_path(identity).display().to_string()
    }
}
