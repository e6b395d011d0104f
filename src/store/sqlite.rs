//! SQLite-backed suite log
//!
//! One table keyed by an autoincrement id, indexed by time and by source.
//! Ids come from SQLite itself and are never reused, even after a clear.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use tracing::{debug, info};

use super::{LogBackend, LogEvent, NewLogEvent, StoreError};
use crate::severity::Severity;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS suite_logs (
    log_id         INTEGER PRIMARY KEY AUTOINCREMENT,
    log_time       INTEGER NOT NULL,
    plugin_source  TEXT    NOT NULL,
    log_level      TEXT    NOT NULL,
    original_level TEXT,
    message        TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_log_time ON suite_logs (log_time);
CREATE INDEX IF NOT EXISTS idx_plugin_source ON suite_logs (plugin_source);
";

/// Other processes may hold the write lock briefly
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Suite log stored in a SQLite database
pub struct SqliteLogStore {
    conn: Mutex<Connection>,
}

/// Row as read from the table, before level and time are validated
struct RawRow {
    id: i64,
    log_time: i64,
    source: String,
    level: String,
    original_level: Option<String>,
    message: String,
}

impl RawRow {
    fn into_event(self) -> Result<LogEvent, StoreError> {
        let level = Severity::parse(&self.level).ok_or_else(|| StoreError::CorruptRow {
            id: self.id,
            reason: format!("unknown level {:?}", self.level),
        })?;
        let timestamp =
            DateTime::from_timestamp(self.log_time, 0).ok_or_else(|| StoreError::CorruptRow {
                id: self.id,
                reason: format!("timestamp {} out of range", self.log_time),
            })?;

        Ok(LogEvent {
            id: self.id,
            timestamp,
            source: self.source,
            level,
            original_level: self.original_level,
            message: self.message,
        })
    }
}

impl SqliteLogStore {
    /// Open (or create) the log database at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "Opened suite log database");
        Self::init(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl LogBackend for SqliteLogStore {
    fn append(&self, event: NewLogEvent) -> Result<LogEvent, StoreError> {
        let conn = self.lock()?;
        // Stamped under the lock so time order never disagrees with id order
        let log_time = Utc::now().timestamp();
        conn.execute(
            "INSERT INTO suite_logs (log_time, plugin_source, log_level, original_level, message)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                log_time,
                event.source,
                event.level.as_str(),
                event.original_level,
                event.message
            ],
        )?;
        // The connection is held, so no other insert can interleave here
        let id = conn.last_insert_rowid();

        RawRow {
            id,
            log_time,
            source: event.source,
            level: event.level.as_str().to_string(),
            original_level: event.original_level,
            message: event.message,
        }
        .into_event()
    }

    fn fetch_recent(&self, limit: usize) -> Result<Vec<LogEvent>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT log_id, log_time, plugin_source, log_level, original_level, message
             FROM suite_logs
             ORDER BY log_time DESC, log_id DESC
             LIMIT ?1",
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], |row| {
            Ok(RawRow {
                id: row.get(0)?,
                log_time: row.get(1)?,
                source: row.get(2)?,
                level: row.get(3)?,
                original_level: row.get(4)?,
                message: row.get(5)?,
            })
        })?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?.into_event()?);
        }
        Ok(events)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM suite_logs", [])?;
        tx.commit()?;
        debug!(removed, "Cleared suite log table");
        Ok(())
    }

    fn count(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM suite_logs", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}
