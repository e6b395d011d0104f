//! Diagnostics file retention
//!
//! Only the service's own diagnostics files are swept. The suite log is never
//! touched here; it only shrinks through an explicit clear.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::FILE_PREFIX;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Age limit for diagnostics files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    max_age: Duration,
}

/// Result of one sweep over the logs directory
#[derive(Debug, Default)]
pub struct SweepReport {
    pub removed: Vec<PathBuf>,
    /// Expired files that could not be deleted
    pub failed: usize,
}

impl Default for RetentionPolicy {
    /// One week
    fn default() -> Self {
        Self::days(7)
    }
}

impl RetentionPolicy {
    pub fn days(days: u32) -> Self {
        Self {
            max_age: DAY * days,
        }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Whether a file last written at `modified` is past the limit at `now`.
    ///
    /// Files stamped in the future are never expired.
    pub fn is_expired(&self, modified: SystemTime, now: SystemTime) -> bool {
        now.duration_since(modified)
            .map(|age| age > self.max_age)
            .unwrap_or(false)
    }

    /// Remove expired diagnostics files from `dir`
    pub fn sweep(&self, dir: &Path) -> Result<SweepReport> {
        self.sweep_at(dir, SystemTime::now())
    }

    fn sweep_at(&self, dir: &Path, now: SystemTime) -> Result<SweepReport> {
        let mut report = SweepReport::default();
        if !dir.is_dir() {
            return Ok(report);
        }

        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to list diagnostics in {}", dir.display()))?;
        for entry in entries.flatten() {
            let path = entry.path();
            if !is_diagnostics_file(&path) {
                continue;
            }
            let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
                continue;
            };
            if !self.is_expired(modified, now) {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!(path = %path.display(), "Removed old diagnostics file");
                    report.removed.push(path);
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Could not remove old diagnostics file"
                    );
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

/// `status-center-*.log` and nothing else
fn is_diagnostics_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.starts_with(FILE_PREFIX) && name.ends_with(".log"))
}
