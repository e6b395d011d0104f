//! File sink for `tracing` output

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Local;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use super::FILE_PREFIX;

/// Default filter when `RUST_LOG` is unset
const DEFAULT_FILTER: &str = "status_center=info";

/// Information about the current diagnostics file
#[derive(Debug, Clone)]
pub struct DiagnosticsFileInfo {
    pub path: PathBuf,
}

/// Generate a timestamped diagnostics file path
pub fn create_log_file_path(logs_dir: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    logs_dir.join(format!("{}{}.log", FILE_PREFIX, timestamp))
}

/// Writer handing each formatted event to the shared file
struct SharedFileWriter {
    file: Arc<Mutex<File>>,
}

impl Write for SharedFileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        // A poisoned lock only means another writer panicked mid-line
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        file.flush()
    }
}

/// Writer factory for tracing-subscriber
struct SharedFileMaker {
    file: Arc<Mutex<File>>,
}

impl<'a> MakeWriter<'a> for SharedFileMaker {
    type Writer = SharedFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SharedFileWriter {
            file: Arc::clone(&self.file),
        }
    }
}

/// Keeps the diagnostics file open; hold it for the life of the process
pub struct DiagnosticsGuard {
    file: Arc<Mutex<File>>,
}

impl Drop for DiagnosticsGuard {
    fn drop(&mut self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

fn open_log_file(logs_dir: &Path) -> Result<(PathBuf, Arc<Mutex<File>>)> {
    fs::create_dir_all(logs_dir).context("Failed to create logs directory")?;

    let path = create_log_file_path(logs_dir);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .context("Failed to open diagnostics file")?;

    Ok((path, Arc::new(Mutex::new(file))))
}

/// Install the global subscriber writing to a new file in `logs_dir`
pub fn init_file_logging(logs_dir: PathBuf) -> Result<(DiagnosticsFileInfo, DiagnosticsGuard)> {
    let (path, file) = open_log_file(&logs_dir)?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(SharedFileMaker {
            file: Arc::clone(&file),
        })
        .with_ansi(false)
        .with_target(true);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_FILTER.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .context("Failed to install diagnostics subscriber")?;

    Ok((DiagnosticsFileInfo { path }, DiagnosticsGuard { file }))
}
