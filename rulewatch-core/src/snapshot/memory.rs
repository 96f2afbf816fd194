//! In-process snapshot store for tests and dry runs. Nothing survives the process.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

use super::{Snapshot, SnapshotStore};
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    records: RwLock<HashMap<String, Snapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map_or(0, |records| records.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, identity: &str) -> StoreResult<Option<Snapshot>> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records.get(identity.trim()).cloned())
    }

    fn put(
        &self,
        identity: &str,
        content_hash: &str,
        normalized_text: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let identity = identity.trim().to_string();
        let snapshot = Snapshot {
            identity: identity.clone(),
            content_hash: content_hash.to_string(),
            normalized_text: normalized_text.to_string(),
            last_seen_at: now,
        };
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        records.insert(identity, snapshot);
        Ok(())
    }

    fn describe_key(&self, identity: &str) -> String {
        format!("memory:{}", identity.trim())
    }
}
