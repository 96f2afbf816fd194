//! Diff and numeric delta extraction between two normalized texts.
//!
//! Both functions are pure: no I/O, no clock, same input same output.

use regex::Regex;
use serde::{Deserialize, Serialize};
use similar::TextDiff;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Label of the old side in unified diff headers.
pub const OLD_LABEL: &str = "previous";

/// Label of the new side in unified diff headers.
pub const NEW_LABEL: &str = "current";

/// Optional sign, digits, optional fraction, optional trailing `%` or `$`.
///
/// Comma-grouped numbers split at the comma (`1,200` yields `1` and `200`).
static NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[+-]?\d+(?:\.\d+)?%?\$?").unwrap());

/// Numeric tokens that appeared or disappeared between two texts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericDelta {
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
}

impl NumericDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Everything the event assembler needs for a CHANGED document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub diff_text: String,
    pub delta: NumericDelta,
}

/// Collect the distinct numeric tokens of a text.
pub fn extract_numbers(text: &str) -> BTreeSet<String> {
    NUMBER_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Set differences of numeric tokens: `added = new - old`, `removed = old - new`.
pub fn numeric_delta(old: &str, new: &str) -> NumericDelta {
    let old_tokens = extract_numbers(old);
    let new_tokens = extract_numbers(new);
    NumericDelta {
        added: new_tokens.difference(&old_tokens).cloned().collect(),
        removed: old_tokens.difference(&new_tokens).cloned().collect(),
    }
}

/// Unified line diff labelled `previous` / `current`.
///
/// Empty when the texts are line-for-line identical.
pub fn unified_diff(old: &str, new: &str, context: usize) -> String {
    let old = with_trailing_newline(old);
    let new = with_trailing_newline(new);
    let diff = TextDiff::from_lines(old.as_str(), new.as_str());
    diff.unified_diff()
        .context_radius(context)
        .missing_newline_hint(false)
        .header(OLD_LABEL, NEW_LABEL)
        .to_string()
}

/// Diff plus numeric delta in one call.
pub fn summarize(old: &str, new: &str, context: usize) -> DiffSummary {
    DiffSummary {
        diff_text: unified_diff(old, new, context),
        delta: numeric_delta(old, new),
    }
}

// A last line without '\n' would otherwise differ from the same line followed by more text.
fn with_trailing_newline(text: &str) -> String {
    if text.is_empty() || text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{text}\n")
    }
}
