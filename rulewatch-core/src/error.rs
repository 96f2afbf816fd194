//! Error types for the change detection engine.

use thiserror::Error;

/// Snapshot storage failure.
///
/// Only "not found" is ever turned into an absent snapshot; every other variant reaches
/// the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on snapshot {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt snapshot {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Storage key {key} holds identity '{found}', expected '{expected}'")]
    KeyCollision {
        key: String,
        expected: String,
        found: String,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Snapshot store lock poisoned")]
    Poisoned,

    #[error("Unsupported store backend: {0}")]
    UnsupportedBackend(String),
}

impl StoreError {
    pub(crate) fn io(key: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            key: key.into(),
            source,
        }
    }
}

/// Per-document pipeline failure. Never aborts a cycle.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Snapshot read failed for {identity}: {source}")]
    SnapshotRead {
        identity: String,
        #[source]
        source: StoreError,
    },

    #[error("Snapshot write failed for {identity}: {source}")]
    SnapshotWrite {
        identity: String,
        #[source]
        source: StoreError,
    },

    #[error("Event delivery failed for {identity}: {source}")]
    Delivery {
        identity: String,
        #[source]
        source: NotifyError,
    },
}

impl CoreError {
    /// Identity of the document the failure belongs to.
    pub fn identity(&self) -> &str {
        match self {
            Self::SnapshotRead { identity, .. }
            | Self::SnapshotWrite { identity, .. }
            | Self::Delivery { identity, .. } => identity,
        }
    }

    pub const fn is_read(&self) -> bool {
        matches!(self, Self::SnapshotRead { .. })
    }
}

/// Notifier sink failure.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notifier I/O failed")]
    Io(#[from] std::io::Error),

    #[error("Event serialization failed")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for snapshot store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_error_cause_printed_once() {
        use std::error::Error as _;

        let err = NotifyError::from(std::io::Error::other("disk full"));
        assert_eq!(err.to_string(), "Notifier I/O failed");
        assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("disk full"));
    }

    #[test]
    fn test_delivery_error_identity() {
        let err = CoreError::Delivery {
            identity: "2026-1".into(),
            source: NotifyError::from(std::io::Error::other("disk full")),
        };
        assert_eq!(err.identity(), "2026-1");
        assert!(!err.is_read());
    }
}
