//! Hand-off seams after event assembly: summarizers and notifiers.
//!
//! The engine only produces [`ChangeEvent`]s. Rendering and delivery belong to
//! implementations of these traits, which live with the driver.

use crate::error::NotifyError;
use crate::event::ChangeEvent;
use rulewatch_common::util::truncate_with_ellipsis;

/// Delivers change events somewhere (console, file, queue).
pub trait Notifier {
    /// Deliver one event.
    fn notify(&mut self, event: &ChangeEvent) -> Result<(), NotifyError>;

    /// Called once per cycle after the last event.
    fn flush(&mut self) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Produces a short human-readable summary for an event.
pub trait Summarizer {
    fn summarize(&self, event: &ChangeEvent) -> String;
}

/// Deterministic summary built from the event fields alone.
#[derive(Debug, Clone)]
pub struct TemplateSummarizer {
    max_chars: usize,
}

impl Default for TemplateSummarizer {
    fn default() -> Self {
        Self { max_chars: 280 }
    }
}

impl TemplateSummarizer {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

impl Summarizer for TemplateSummarizer {
    fn summarize(&self, event: &ChangeEvent) -> String {
        let mut summary = if event.is_new() {
            format!("New document for {}: {}", event.owner, event.title)
        } else {
            format!("Updated document for {}: {}", event.owner, event.title)
        };

        let numbers = event.numeric_summary();
        if !numbers.is_empty() {
            summary.push_str(". ");
            summary.push_str(&numbers.join("; "));
        }

        truncate_with_ellipsis(&summary, self.max_chars)
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    pub events: Vec<ChangeEvent>,
}

impl Notifier for CollectingNotifier {
    fn notify(&mut self, event: &ChangeEvent) -> Result<(), NotifyError> {
        self.events.push(event.clone());
        Ok(())
    }
}
