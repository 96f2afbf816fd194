//! Per-cycle driver core: dedup, then normalize → detect → diff → route → assemble
//! for each entry, one at a time.
//!
//! Every document's failure is isolated. `process_entry` returns a typed result per
//! document; `run_cycle` collects them into a [`CycleReport`] and never aborts early.
//!
//! [`Pipeline::deliver_cycle_at`] hands each event to a [`Notifier`] before its snapshot
//! is written. An event the notifier rejects leaves the stored snapshot as it was, so the
//! document is detected again next cycle.

use chrono::{DateTime, Utc};
use rulewatch_common::Config;
use serde::Serialize;
use std::sync::Arc;

use crate::dedup::{DedupCoordinator, SourceBatch, SourcedEntry};
use crate::detector::{ChangeDetector, Classification, Detection};
use crate::diff;
use crate::error::{CoreError, NotifyError};
use crate::event::{ChangeEvent, EventAssembler, DEFAULT_PREVIEW_CHARS};
use crate::normalize::normalize;
use crate::notify::Notifier;
use crate::router::OwnerRouter;
use crate::snapshot::SnapshotStore;

/// Default context lines around diff hunks.
pub const DEFAULT_DIFF_CONTEXT: usize = 2;

#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub preview_chars: usize,
    /// Clamped to 2..=3
    pub diff_context: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            preview_chars: DEFAULT_PREVIEW_CHARS,
            diff_context: DEFAULT_DIFF_CONTEXT,
        }
    }
}

/// Outcome for one document that was read successfully.
#[derive(Debug)]
pub struct Processed {
    pub identity: String,
    pub classification: Classification,
    /// Present for NEW and CHANGED
    pub event: Option<ChangeEvent>,
    /// The snapshot could not be updated; the event is still valid.
    pub write_error: Option<CoreError>,
}

/// Counters for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleStats {
    pub received: usize,
    pub dropped: usize,
    pub duplicates: usize,
    pub new: usize,
    pub changed: usize,
    pub unchanged: usize,
    pub read_failures: usize,
    pub write_failures: usize,
    /// Events the notifier rejected; their snapshots were left untouched
    pub delivery_failures: usize,
}


/// Everything a cycle produced.
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Events in processing order. When delivering, only the accepted ones.
    pub events: Vec<ChangeEvent>,
    pub failures: Vec<CoreError>,
    pub stats: CycleStats,
    /// Set when the notifier could not flush at the end of a delivering cycle
    pub flush_error: Option<NotifyError>,
}

pub struct Pipeline {
    detector: ChangeDetector,
    router: OwnerRouter,
    dedup: DedupCoordinator,
    assembler: EventAssembler,
    diff_context: usize,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        router: OwnerRouter,
        dedup: DedupCoordinator,
        options: PipelineOptions,
    ) -> Self {
        Self {
            detector: ChangeDetector::new(store),
            router,
            dedup,
            assembler: EventAssembler::new(options.preview_chars),
            diff_context: options.diff_context.clamp(2, 3),
        }
    }

    /// Pipeline wired from configuration: owner table, source priority, detector tuning.
    pub fn from_config(config: &Config, store: Arc<dyn SnapshotStore>) -> Self {
        Self::new(
            store,
            OwnerRouter::from_config(&config.routing),
            DedupCoordinator::new(config.source_priority()),
            PipelineOptions {
                preview_chars: config.detector.preview_chars,
                diff_context: config.detector.diff_context,
            },
        )
    }

    pub fn store(&self) -> &Arc<dyn SnapshotStore> {
        self.detector.store()
    }

    /// Process a single, already-deduplicated entry.
    ///
    /// `Err` means the snapshot could not be read: the document is skipped this cycle,
    /// nothing was written and no event exists.
    pub fn process_entry(
        &self,
        sourced: &SourcedEntry,
        now: DateTime<Utc>,
    ) -> Result<Processed, CoreError> {
        self.process_with(sourced, now, |_| Ok(()))
    }

    /// Process an entry, committing its snapshot only once `deliver` accepts the event.
    fn process_with<F>(
        &self,
        sourced: &SourcedEntry,
        now: DateTime<Utc>,
        deliver: F,
    ) -> Result<Processed, CoreError>
    where
        F: FnOnce(&ChangeEvent) -> Result<(), NotifyError>,
    {
        let entry = &sourced.entry;
        let identity = entry.canonical_identity();
        let text = normalize(&entry.raw_body);

        let (detection, hash) = self.detector.classify(identity, &text)?;
        let classification = detection.classification();

        let event = match detection {
            Detection::Unchanged => {
                tracing::debug!(identity = %identity, "Document unchanged");
                return Ok(Processed {
                    identity: identity.to_string(),
                    classification,
                    event: None,
                    write_error: None,
                });
            }
            Detection::New => {
                let owner = self.router.route(&entry.title, Some(text.as_str()));
                self.assembler
                    .assemble_new(entry, &sourced.strategy, owner, &text)
            }
            Detection::Changed { previous } => {
                let owner = self.router.route(&entry.title, Some(text.as_str()));
                let summary = diff::summarize(&previous.normalized_text, &text, self.diff_context);
                self.assembler
                    .assemble_changed(entry, &sourced.strategy, owner, summary)
            }
        };

        deliver(&event).map_err(|source| CoreError::Delivery {
            identity: identity.to_string(),
            source,
        })?;

        tracing::info!(
            identity = %identity,
            classification = %classification,
            owner = %event.owner,
            strategy = %sourced.strategy,
            "Document {}",
            if event.is_new() { "detected" } else { "changed" }
        );

        let write_error = self
            .detector
            .commit(identity, &hash, &text, now)
            .err()
            .map(|source| {
                tracing::error!(
                    identity = %identity,
                    error = %source,
                    "Snapshot write failed; change will be re-detected next cycle"
                );
                CoreError::SnapshotWrite {
                    identity: identity.to_string(),
                    source,
                }
            });

        Ok(Processed {
            identity: identity.to_string(),
            classification,
            event: Some(event),
            write_error,
        })
    }

    /// Run one cycle stamped with the current time.
    pub fn run_cycle(&self, batches: Vec<SourceBatch>) -> CycleReport {
        self.run_cycle_at(batches, Utc::now())
    }

    /// Run one cycle: merge batches, then process each entry in order.
    ///
    /// Snapshots are written as soon as a change is detected; delivering the returned
    /// events is up to the caller.
    pub fn run_cycle_at(&self, batches: Vec<SourceBatch>, now: DateTime<Utc>) -> CycleReport {
        self.cycle(batches, now, |_| Ok(()))
    }

    /// Run one cycle, delivering each event through `notifier` before its snapshot is
    /// written. Every event is attempted; rejected ones are counted as delivery failures.
    pub fn deliver_cycle_at(
        &self,
        batches: Vec<SourceBatch>,
        notifier: &mut dyn Notifier,
        now: DateTime<Utc>,
    ) -> CycleReport {
        let mut report = self.cycle(batches, now, |event| notifier.notify(event));
        if let Err(e) = notifier.flush() {
            tracing::error!(error = %e, "Notifier flush failed");
            report.flush_error = Some(e);
        }
        report
    }

    fn cycle<F>(&self, batches: Vec<SourceBatch>, now: DateTime<Utc>, mut deliver: F) -> CycleReport
    where
        F: FnMut(&ChangeEvent) -> Result<(), NotifyError>,
    {
        let received = batches.iter().map(|b| b.entries.len()).sum();
        let merged = self.dedup.merge(batches);

        let mut report = CycleReport {
            stats: CycleStats {
                received,
                dropped: merged.dropped,
                duplicates: merged.duplicates,
                ..CycleStats::default()
            },
            ..CycleReport::default()
        };

        for sourced in &merged.entries {
            match self.process_with(sourced, now, &mut deliver) {
                Ok(processed) => {
                    match processed.classification {
                        Classification::New => report.stats.new += 1,
                        Classification::Changed => report.stats.changed += 1,
                        Classification::Unchanged => report.stats.unchanged += 1,
                    }
                    if let Some(event) = processed.event {
                        report.events.push(event);
                    }
                    if let Some(err) = processed.write_error {
                        report.stats.write_failures += 1;
                        report.failures.push(err);
                    }
                }
                Err(err @ CoreError::Delivery { .. }) => {
                    tracing::error!(
                        identity = %err.identity(),
                        strategy = %sourced.strategy,
                        error = %format_chain(&err),
                        "Event not delivered; snapshot left for next cycle"
                    );
                    report.stats.delivery_failures += 1;
                    report.failures.push(err);
                }
                Err(err) => {
                    tracing::warn!(
                        identity = %err.identity(),
                        strategy = %sourced.strategy,
                        error = %err,
                        "Skipping document this cycle"
                    );
                    report.stats.read_failures += 1;
                    report.failures.push(err);
                }
            }
        }

        let stats = &report.stats;
        tracing::info!(
            received = stats.received,
            duplicates = stats.duplicates,
            dropped = stats.dropped,
            new = stats.new,
            changed = stats.changed,
            unchanged = stats.unchanged,
            read_failures = stats.read_failures,
            write_failures = stats.write_failures,
            delivery_failures = stats.delivery_failures,
            "Cycle complete"
        );

        report
    }
}

/// Error message followed by its causes.
fn format_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
