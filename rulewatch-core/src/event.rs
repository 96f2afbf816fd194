//! Change events and their assembly. No I/O happens here.

use chrono::{DateTime, Utc};
use rulewatch_common::util::truncate_chars;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::detector::Classification;
use crate::diff::DiffSummary;
use crate::entry::Entry;

/// Default character cap for NEW previews.
pub const DEFAULT_PREVIEW_CHARS: usize = 600;

/// A detected NEW or CHANGED document, ready for a notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub identity: String,
    pub title: String,
    pub link: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub classification: Classification,
    pub owner: String,
    /// Unified diff; empty for NEW
    pub diff_text: String,
    pub numeric_added: BTreeSet<String>,
    pub numeric_removed: BTreeSet<String>,
    /// Bounded prefix of the normalized text; empty for CHANGED
    pub preview_text: String,
    /// Fetch strategy that supplied the entry
    pub source: String,
}

impl ChangeEvent {
    pub fn is_new(&self) -> bool {
        self.classification == Classification::New
    }

    /// `Added numbers: ...` / `Removed numbers: ...` lines, tokens sorted, empty sets omitted.
    pub fn numeric_summary(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if !self.numeric_added.is_empty() {
            lines.push(format!("Added numbers: {}", join(&self.numeric_added)));
        }
        if !self.numeric_removed.is_empty() {
            lines.push(format!("Removed numbers: {}", join(&self.numeric_removed)));
        }
        lines
    }
}

fn join(tokens: &BTreeSet<String>) -> String {
    tokens.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Builds [`ChangeEvent`]s from detector output.
#[derive(Debug, Clone, Copy)]
pub struct EventAssembler {
    preview_chars: usize,
}

impl Default for EventAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_CHARS)
    }
}

impl EventAssembler {
    pub fn new(preview_chars: usize) -> Self {
        Self { preview_chars }
    }

    pub fn preview_chars(&self) -> usize {
        self.preview_chars
    }

    fn base(
        entry: &Entry,
        source: &str,
        owner: &str,
        classification: Classification,
    ) -> ChangeEvent {
        ChangeEvent {
            identity: entry.canonical_identity().to_string(),
            title: entry.title.clone(),
            link: entry.link.clone(),
            published: entry.published,
            classification,
            owner: owner.to_string(),
            diff_text: String::new(),
            numeric_added: BTreeSet::new(),
            numeric_removed: BTreeSet::new(),
            preview_text: String::new(),
            source: source.to_string(),
        }
    }

    /// NEW: preview of the normalized text, no diff.
    pub fn assemble_new(
        &self,
        entry: &Entry,
        source: &str,
        owner: &str,
        normalized_text: &str,
    ) -> ChangeEvent {
        ChangeEvent {
            preview_text: truncate_chars(normalized_text, self.preview_chars).to_string(),
            ..Self::base(entry, source, owner, Classification::New)
        }
    }

    /// CHANGED: diff and numeric deltas, no preview.
    pub fn assemble_changed(
        &self,
        entry: &Entry,
        source: &str,
        owner: &str,
        summary: DiffSummary,
    ) -> ChangeEvent {
        ChangeEvent {
            diff_text: summary.diff_text,
            numeric_added: summary.delta.added,
            numeric_removed: summary.delta.removed,
            ..Self::base(entry, source, owner, Classification::Changed)
        }
    }
}
