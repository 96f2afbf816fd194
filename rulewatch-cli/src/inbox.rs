//! Inbox files: the hand-off point between fetch adapters and the watcher.
//!
//! Each configured source owns one JSON file. Adapters overwrite it with whatever they
//! fetched; the watcher reads it at the start of every cycle. Two layouts are accepted:
//! a bare array of entries, or a search response object with a `results` array.
//!
//! Entries are decoded one at a time. A malformed entry is dropped on its own and the
//! rest of the file still loads.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rulewatch_common::{Config, SourceConfig};
use rulewatch_core::{RawEntry, SourceBatch};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InboxFile {
    Entries(Vec<Value>),
    Response { results: Vec<Value> },
}

impl InboxFile {
    fn into_entries(self) -> Vec<Value> {
        match self {
            Self::Entries(entries) | Self::Response { results: entries } => entries,
        }
    }
}

/// Batches loaded for one cycle.
#[derive(Debug, Default)]
pub struct Inbox {
    pub batches: Vec<SourceBatch>,
    /// Raw entries that were malformed or had neither an id nor a link
    pub dropped: usize,
    /// Sources whose file was missing or unreadable
    pub failed_sources: Vec<String>,
}

/// Read and resolve one source's inbox file.
///
/// Returns the batch plus the number of entries dropped as malformed or lacking an
/// identity.
pub fn load_source(source: &SourceConfig, now: DateTime<Utc>) -> Result<(SourceBatch, usize)> {
    let path = Path::new(&source.path);
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read inbox {}", path.display()))?;
    let file: InboxFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse inbox {}", path.display()))?;

    let raw = file.into_entries();
    let total = raw.len();
    let mut entries = Vec::with_capacity(total);
    for (idx, value) in raw.into_iter().enumerate() {
        match RawEntry::deserialize(value) {
            Ok(raw) => entries.extend(raw.resolve(now)),
            Err(e) => {
                tracing::warn!(source = %source.name, index = idx, error = %e, "Skipping malformed entry");
            }
        }
    }
    let dropped = total - entries.len();

    if dropped > 0 {
        tracing::debug!(source = %source.name, count = dropped, "Dropped unusable entries");
    }
    Ok((SourceBatch::new(source.name.clone(), entries), dropped))
}

/// Load every enabled source in declared order.
///
/// A source that cannot be read contributes nothing this cycle; the others still load.
pub fn load_inbox(config: &Config, now: DateTime<Utc>) -> Inbox {
    let mut inbox = Inbox::default();
    for source in config.enabled_sources() {
        match load_source(source, now) {
            Ok((batch, dropped)) => {
                tracing::debug!(source = %source.name, entries = batch.entries.len(), "Inbox loaded");
                inbox.dropped += dropped;
                inbox.batches.push(batch);
            }
            Err(e) => {
                tracing::warn!(source = %source.name, error = %format!("{e:#}"), "Skipping source this cycle");
                inbox.failed_sources.push(source.name.clone());
            }
        }
    }
    inbox
}
