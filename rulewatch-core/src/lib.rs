//! Rulewatch Core - change detection engine for regulatory documents.
//!
//! Given the entries fetched in one cycle, the engine decides which documents are new or
//! have changed since they were last seen, explains what changed, and routes each change
//! to an owning team.
//!
//! ## Data flow
//!
//! ```text
//! SourceBatch* ─▶ DedupCoordinator ─▶ SourcedEntry (identity-unique, priority order)
//!                                           │
//!                                           ▼
//!                 normalize ─▶ ChangeDetector ◀──▶ dyn SnapshotStore
//!                                           │
//!                 ┌─────────────┬───────────┴───────────┐
//!                 ▼             ▼                       ▼
//!               NEW          CHANGED                UNCHANGED
//!            (preview)   (diff + numeric delta)     (nothing)
//!                 └──────┬──────┘
//!                        ▼
//!           OwnerRouter ─▶ EventAssembler ─▶ ChangeEvent ─▶ Notifier
//! ```
//!
//! Processing is synchronous and sequential. Each document's failure is isolated; a
//! cycle always runs to completion.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod dedup;
pub mod detector;
pub mod diff;
pub mod entry;
pub mod error;
pub mod event;
pub mod fingerprint;
pub mod normalize;
pub mod notify;
pub mod pipeline;
pub mod router;
pub mod snapshot;

// Re-export commonly used types
pub use dedup::{DedupCoordinator, DedupOutcome, SourceBatch, SourcedEntry};
pub use detector::{ChangeDetector, Classification, Detection, Observation};
pub use diff::{extract_numbers, numeric_delta, unified_diff, DiffSummary, NumericDelta};
pub use entry::{Entry, RawEntry};
pub use error::{CoreError, NotifyError, StoreError, StoreResult};
pub use event::{ChangeEvent, EventAssembler};
pub use fingerprint::{content_hash, storage_key};
pub use normalize::normalize;
pub use notify::{CollectingNotifier, Notifier, Summarizer, TemplateSummarizer};
pub use pipeline::{CycleReport, CycleStats, Pipeline, PipelineOptions, Processed};
pub use router::{OwnerRouter, UNASSIGNED};
pub use snapshot::{
    open_store, FileSnapshotStore, MemorySnapshotStore, Snapshot, SnapshotStore,
    SqliteSnapshotStore,
};
