//! In-process suite log
//!
//! Keeps events in a vector behind a single lock, for tests and for runs that
//! don't need the log to outlive the process.

use std::sync::RwLock;

use chrono::{SubsecRound, Utc};

use super::{LogBackend, LogEvent, NewLogEvent, StoreError};

#[derive(Debug)]
struct Inner {
    events: Vec<LogEvent>,
    next_id: i64,
}

/// Suite log held in memory
#[derive(Debug)]
pub struct MemoryLogStore {
    inner: RwLock<Inner>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                events: Vec::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for MemoryLogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LogBackend for MemoryLogStore {
    fn append(&self, event: NewLogEvent) -> Result<LogEvent, StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;

        let stored = LogEvent {
            id: inner.next_id,
            timestamp: Utc::now().trunc_subsecs(0),
            source: event.source,
            level: event.level,
            original_level: event.original_level,
            message: event.message,
        };
        inner.next_id += 1;
        inner.events.push(stored.clone());

        Ok(stored)
    }

    fn fetch_recent(&self, limit: usize) -> Result<Vec<LogEvent>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;

        let mut events: Vec<&LogEvent> = inner.events.iter().collect();
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));

        Ok(events.into_iter().take(limit).cloned().collect())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        inner.events.clear();
        Ok(())
    }

    fn count(&self) -> Result<usize, StoreError> {
        self.inner
            .read()
            .map(|inner| inner.events.len())
            .map_err(|_| StoreError::Poisoned)
    }
}
