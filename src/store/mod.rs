//! Suite log persistence
//!
//! Append-only storage of accepted log events with a bounded recency read and
//! a full clear. The store assigns ids and timestamps; callers never do.

mod memory;
mod sqlite;

pub use memory::MemoryLogStore;
pub use sqlite::SqliteLogStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::severity::Severity;

/// Hard ceiling on the number of events returned by a recency read
pub const DEFAULT_FETCH_LIMIT: usize = 200;

/// Maximum length of the `source` label, in characters
pub const SOURCE_MAX_CHARS: usize = 100;

/// Maximum length of a kept unrecognized level label, in characters
pub const LEVEL_MAX_CHARS: usize = 20;

/// Errors raised by a log backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("corrupt log row {id}: {reason}")]
    CorruptRow { id: i64, reason: String },

    #[error("log store lock poisoned")]
    Poisoned,

    #[error("log store unavailable: {0}")]
    Unavailable(String),
}

/// A persisted log event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Store-assigned id, strictly increasing with insertion order
    pub id: i64,
    /// Insert time, second resolution
    pub timestamp: DateTime<Utc>,
    /// Component that produced the event
    pub source: String,
    pub level: Severity,
    /// Caller's level label when it was not a known level name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_level: Option<String>,
    pub message: String,
}

/// An accepted event waiting to be appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLogEvent {
    pub source: String,
    pub level: Severity,
    pub original_level: Option<String>,
    pub message: String,
}

/// Persistence interface for the suite log
pub trait LogBackend: Send + Sync {
    /// Append an event, assigning its id and timestamp
    fn append(&self, event: NewLogEvent) -> Result<LogEvent, StoreError>;

    /// Up to `limit` events, newest first (timestamp, then id, descending)
    fn fetch_recent(&self, limit: usize) -> Result<Vec<LogEvent>, StoreError>;

    /// Remove every event atomically
    fn clear(&self) -> Result<(), StoreError>;

    /// Number of stored events
    fn count(&self) -> Result<usize, StoreError>;
}
