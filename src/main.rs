use std::sync::Arc;

use anyhow::{Context, Result};

use status_center::config::{self, Config};
use status_center::diagnostics;
use status_center::logger::SuiteLogger;
use status_center::server::{self, AppState};
use status_center::settings::{SettingsStore, TomlSettingsStore};
use status_center::store::SqliteLogStore;
use status_center::suite::SuiteRegistry;

const SOURCE: &str = "Status Center";

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    config::ensure_directories(&config)?;

    // Initialize diagnostics BEFORE any tracing calls
    let (diagnostics_file, _guard) = diagnostics::init_file_logging(config::logs_dir())?;

    match diagnostics::RetentionPolicy::default().sweep(&config::logs_dir()) {
        Ok(report) if !report.removed.is_empty() => {
            tracing::info!("Cleaned up {} old diagnostics files", report.removed.len());
        }
        Ok(_) => {}
        Err(e) => tracing::warn!("Diagnostics cleanup failed: {:#}", e),
    }

    tracing::info!("Diagnostics logging to: {}", diagnostics_file.path.display());

    let store = SqliteLogStore::open(&config.database_path).with_context(|| {
        format!(
            "Failed to open suite log at {}",
            config.database_path.display()
        )
    })?;

    // First activation writes the default minimum level
    let settings: Arc<dyn SettingsStore> = Arc::new(TomlSettingsStore::new());
    match settings.ensure_defaults() {
        Ok(true) => tracing::info!("Wrote default log settings"),
        Ok(false) => {}
        Err(e) => tracing::warn!("Could not write default log settings: {}", e),
    }

    let logger = Arc::new(SuiteLogger::new(Arc::new(store), Arc::clone(&settings)));
    let registry = Arc::new(SuiteRegistry::from_plugins(
        config.suite_prefix.clone(),
        &config.plugins,
    ));

    let state = AppState::new(Arc::clone(&logger), settings, registry);
    let handle = server::start(config.admin_port, state).await?;
    logger.log_info(SOURCE, format!("Admin server started on {}", handle.addr()));

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    logger.log_info(SOURCE, "Shutting down");
    handle.shutdown();
    Ok(())
}
