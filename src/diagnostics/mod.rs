//! Diagnostics output for the Status Center itself
//!
//! The service's own `tracing` output goes to a timestamped file in the logs
//! directory. This is also where suite log write failures end up, since the
//! suite log cannot record its own outages.

mod file_writer;
mod retention;

pub use file_writer::{init_file_logging, DiagnosticsFileInfo, DiagnosticsGuard};
pub use retention::{RetentionPolicy, SweepReport};

/// Prefix of every diagnostics file name
pub(crate) const FILE_PREFIX: &str = "status-center-";
