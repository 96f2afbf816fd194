//! Change detector: one hash comparison per document per cycle.
//!
//! ```text
//! UNSEEN ──(first sight)──▶ NEW ──▶ STABLE
//! STABLE ──(hash equal)───▶ UNCHANGED (no write)
//! STABLE ──(hash differs)─▶ CHANGED (diff against stored text, then write)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::{CoreError, StoreError};
use crate::fingerprint::content_hash;
use crate::snapshot::{Snapshot, SnapshotStore};

/// Outcome of comparing current content with the stored snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Classification {
    New,
    Changed,
    Unchanged,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "NEW"),
            Self::Changed => write!(f, "CHANGED"),
            Self::Unchanged => write!(f, "UNCHANGED"),
        }
    }
}

/// Classification plus the prior snapshot a CHANGED result is diffed against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    New,
    Changed { previous: Snapshot },
    Unchanged,
}

impl Detection {
    pub fn classification(&self) -> Classification {
        match self {
            Self::New => Classification::New,
            Self::Changed { .. } => Classification::Changed,
            Self::Unchanged => Classification::Unchanged,
        }
    }
}

/// Result of one observation.
#[derive(Debug)]
pub struct Observation {
    pub detection: Detection,
    pub content_hash: String,
    /// Set when the change was detected but persisting the new snapshot failed.
    pub write_error: Option<StoreError>,
}

/// Compares normalized text against the snapshot store and persists changes.
#[derive(Clone)]
pub struct ChangeDetector {
    store: Arc<dyn SnapshotStore>,
}

impl ChangeDetector {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn SnapshotStore> {
        &self.store
    }

    /// Classify `normalized_text` for `identity` and update the snapshot when needed.
    ///
    /// A read failure is returned as an error and nothing is written. A write failure
    /// is reported in [`Observation::write_error`]; the classification still stands.
    pub fn observe(
        &self,
        identity: &str,
        normalized_text: &str,
        now: DateTime<Utc>,
    ) -> Result<Observation, CoreError> {
        let (detection, hash) = self.classify(identity, normalized_text)?;
        let write_error = match detection {
            Detection::Unchanged => None,
            Detection::New | Detection::Changed { .. } => {
                self.commit(identity, &hash, normalized_text, now).err()
            }
        };

        Ok(Observation {
            detection,
            content_hash: hash,
            write_error,
        })
    }

    /// Compare against the stored snapshot without writing anything.
    ///
    /// Returns the detection and the content hash to pass to [`Self::commit`].
    pub fn classify(
        &self,
        identity: &str,
        normalized_text: &str,
    ) -> Result<(Detection, String), CoreError> {
        let hash = content_hash(normalized_text);

        let previous = self
            .store
            .get(identity)
            .map_err(|source| CoreError::SnapshotRead {
                identity: identity.to_string(),
                source,
            })?;

        let detection = match previous {
            None => Detection::New,
            Some(previous) if previous.content_hash == hash => Detection::Unchanged,
            Some(previous) => Detection::Changed { previous },
        };
        Ok((detection, hash))
    }

    /// Persist the snapshot for a NEW or CHANGED classification.
    pub fn commit(
        &self,
        identity: &str,
        content_hash: &str,
        normalized_text: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.store.put(identity, content_hash, normalized_text, now)
    }
}
