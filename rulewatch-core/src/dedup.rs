//! Dedup coordinator: merge per-strategy batches into one identity-unique sequence.
//!
//! Priority is an explicit list of strategy names. Batches are visited in that order
//! regardless of the order they arrive in; strategies missing from the list come last,
//! in arrival order. The first occurrence of an identity wins.

use std::collections::HashSet;

use crate::entry::Entry;

/// Entries produced by one fetch strategy in one cycle.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub strategy: String,
    pub entries: Vec<Entry>,
}

impl SourceBatch {
    pub fn new(strategy: impl Into<String>, entries: Vec<Entry>) -> Self {
        Self {
            strategy: strategy.into(),
            entries,
        }
    }
}

/// An entry tagged with the strategy that supplied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcedEntry {
    pub strategy: String,
    pub entry: Entry,
}

/// Result of merging one cycle's batches.
#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    /// Identity-unique entries in processing order
    pub entries: Vec<SourcedEntry>,
    /// Later copies of an identity already kept
    pub duplicates: usize,
    /// Entries without an identity
    pub dropped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DedupCoordinator {
    priority: Vec<String>,
}

impl DedupCoordinator {
    pub fn new<I, S>(priority: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            priority: priority.into_iter().map(Into::into).collect(),
        }
    }

    pub fn priority(&self) -> &[String] {
        &self.priority
    }

    fn rank(&self, strategy: &str) -> usize {
        self.priority
            .iter()
            .position(|name| name == strategy)
            .unwrap_or(self.priority.len())
    }

    /// Merge batches, keeping the first copy of each identity.
    pub fn merge(&self, mut batches: Vec<SourceBatch>) -> DedupOutcome {
        // Stable: equal ranks keep arrival order.
        batches.sort_by_key(|batch| self.rank(&batch.strategy));

        let mut seen = HashSet::new();
        let mut outcome = DedupOutcome::default();

        for batch in batches {
            for entry in batch.entries {
                let identity = entry.canonical_identity().to_string();
                if identity.is_empty() {
                    outcome.dropped += 1;
                    tracing::debug!(strategy = %batch.strategy, title = %entry.title, "Dropped entry without identity");
                    continue;
                }
                if !seen.insert(identity) {
                    outcome.duplicates += 1;
                    tracing::debug!(
                        strategy = %batch.strategy,
                        identity = %entry.identity,
                        "Duplicate entry discarded"
                    );
                    continue;
                }
                outcome.entries.push(SourcedEntry {
                    strategy: batch.strategy.clone(),
                    entry,
                });
            }
        }

        outcome
    }
}
