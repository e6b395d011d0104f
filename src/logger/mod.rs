//! Suite-wide logging entry point
//!
//! [`SuiteLogger`] is built once at startup and handed to every component that
//! logs. Ingestion never fails from the caller's point of view: filtered events
//! are dropped quietly and storage failures go to the diagnostics log.
//! The operator read and clear paths do return errors.

mod message;

pub use message::LogMessage;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::settings::{LogSettings, SettingsStore};
use crate::severity::{self, Severity};
use crate::store::{
    LogBackend, LogEvent, NewLogEvent, StoreError, DEFAULT_FETCH_LIMIT, LEVEL_MAX_CHARS,
    SOURCE_MAX_CHARS,
};

/// Level used when a caller does not name one
pub const DEFAULT_LEVEL: &str = "INFO";

/// What happened to a single ingested event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Appended with the given id
    Stored(i64),
    /// Below the configured minimum level
    Filtered,
    /// The store rejected the write; already reported to diagnostics
    Failed,
}

/// The suite's shared logging service
pub struct SuiteLogger {
    store: Arc<dyn LogBackend>,
    settings: Arc<dyn SettingsStore>,
    /// Events whose level label was not one of the known names
    unrecognized_levels: AtomicU64,
}

impl SuiteLogger {
    pub fn new(store: Arc<dyn LogBackend>, settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            store,
            settings,
            unrecognized_levels: AtomicU64::new(0),
        }
    }

    /// Log an event from `source`.
    ///
    /// Safe to call before any settings were saved; the minimum then defaults
    /// to `info`.
    pub fn log(&self, source: &str, message: impl Into<LogMessage>, level: &str) {
        self.record(source, message.into(), level);
    }

    /// Log an event at `INFO`
    pub fn log_info(&self, source: &str, message: impl Into<LogMessage>) {
        self.log(source, message, DEFAULT_LEVEL);
    }

    /// Filter, normalize and append one event.
    ///
    /// Never returns an error: the outcome is informational only.
    pub fn record(&self, source: &str, message: LogMessage, level: &str) -> RecordOutcome {
        let (resolved, recognized) = Severity::normalize(level);
        if !recognized {
            self.unrecognized_levels.fetch_add(1, Ordering::Relaxed);
            debug!(label = level, source, "Unrecognized log level, treating as INFO");
        }

        let minimum = self.current_settings().log_level;
        if !severity::should_persist(resolved.as_str(), minimum.setting_name()) {
            return RecordOutcome::Filtered;
        }

        let event = NewLogEvent {
            source: sanitize_source(source),
            level: resolved,
            original_level: (!recognized)
                .then(|| level.chars().take(LEVEL_MAX_CHARS).collect()),
            message: message.render(),
        };

        match self.store.append(event) {
            Ok(stored) => RecordOutcome::Stored(stored.id),
            Err(e) => {
                error!(error = %e, source, "Failed to write suite log event");
                RecordOutcome::Failed
            }
        }
    }

    /// Most recent events, newest first.
    ///
    /// `limit` is capped at [`DEFAULT_FETCH_LIMIT`].
    pub fn fetch_recent(&self, limit: usize) -> Result<Vec<LogEvent>, StoreError> {
        self.store.fetch_recent(limit.min(DEFAULT_FETCH_LIMIT))
    }

    /// Remove every stored event. Irreversible.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.clear()?;
        info!("Suite log cleared");
        Ok(())
    }

    /// Number of events currently stored
    pub fn count(&self) -> Result<usize, StoreError> {
        self.store.count()
    }

    /// How many events arrived with an unrecognized level since startup
    pub fn unrecognized_level_count(&self) -> u64 {
        self.unrecognized_levels.load(Ordering::Relaxed)
    }

    fn current_settings(&self) -> LogSettings {
        self.settings.load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read log settings, using defaults");
            LogSettings::default()
        })
    }
}

/// Strip control characters, collapse whitespace and cap the length
fn sanitize_source(source: &str) -> String {
    source
        .split_whitespace()
        .map(|word| word.chars().filter(|c| !c.is_control()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(SOURCE_MAX_CHARS)
        .collect()
}
