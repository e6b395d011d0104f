//! Persisted log settings
//!
//! Holds the minimum severity recorded by the suite log. Writes go through
//! [`LogSettings::sanitize`], which maps anything outside the known levels to
//! `info`. Reads are cheap and happen before every ingestion decision.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::settings_file_path;
use crate::severity::Severity;

/// Errors from the settings record
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("settings lock poisoned")]
    Poisoned,
}

/// The durable log configuration record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSettings {
    /// Minimum severity persisted, stored lowercase (`debug|info|warning|error`)
    #[serde(with = "level_name", default)]
    pub log_level: Severity,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            log_level: Severity::Info,
        }
    }
}

impl LogSettings {
    /// Build settings from raw form input.
    ///
    /// Only the four lowercase level names are accepted; anything else,
    /// including a missing value, yields the default `info`.
    pub fn sanitize(input: Option<&str>) -> Self {
        let log_level = match input {
            Some("debug") => Severity::Debug,
            Some("info") => Severity::Info,
            Some("warning") => Severity::Warning,
            Some("error") => Severity::Error,
            _ => Severity::Info,
        };
        Self { log_level }
    }

    /// Lowercase name of the configured minimum
    pub fn minimum_level(&self) -> &'static str {
        self.log_level.setting_name()
    }
}

/// Read/write access to the persisted settings record
pub trait SettingsStore: Send + Sync {
    /// Read the current settings; a missing record reads as the default
    fn load(&self) -> Result<LogSettings, SettingsError>;

    /// Persist new settings
    fn save(&self, settings: &LogSettings) -> Result<(), SettingsError>;

    /// Write the default record if none exists yet
    fn ensure_defaults(&self) -> Result<bool, SettingsError>;
}

/// Settings stored as a small TOML file
#[derive(Debug)]
pub struct TomlSettingsStore {
    path: PathBuf,
}

impl TomlSettingsStore {
    /// Store at the default location (~/.status-center/settings.toml)
    pub fn new() -> Self {
        Self {
            path: settings_file_path(),
        }
    }

    /// Store at a custom path (for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file a save is written to before it replaces the record
    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "settings.toml".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> SettingsError {
        SettingsError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Default for TomlSettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for TomlSettingsStore {
    fn load(&self) -> Result<LogSettings, SettingsError> {
        if !self.path.exists() {
            return Ok(LogSettings::default());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        if content.trim().is_empty() {
            return Ok(LogSettings::default());
        }

        Ok(toml::from_str(&content)?)
    }

    fn save(&self, settings: &LogSettings) -> Result<(), SettingsError> {
        let content = toml::to_string_pretty(settings)?;

        // Readers only ever see the old file or the new one, never a truncated one
        let staging = self.staging_path();
        std::fs::write(&staging, content).map_err(|e| self.io_error(e))?;
        std::fs::rename(&staging, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&staging);
            self.io_error(e)
        })
    }

    fn ensure_defaults(&self) -> Result<bool, SettingsError> {
        if self.path.exists() {
            return Ok(false);
        }
        self.save(&LogSettings::default())?;
        Ok(true)
    }
}

/// Settings held in memory only
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: RwLock<Option<LogSettings>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the given minimum level
    pub fn with_level(level: Severity) -> Self {
        Self {
            settings: RwLock::new(Some(LogSettings { log_level: level })),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<LogSettings, SettingsError> {
        self.settings
            .read()
            .map(|s| s.unwrap_or_default())
            .map_err(|_| SettingsError::Poisoned)
    }

    fn save(&self, settings: &LogSettings) -> Result<(), SettingsError> {
        let mut guard = self.settings.write().map_err(|_| SettingsError::Poisoned)?;
        *guard = Some(*settings);
        Ok(())
    }

    fn ensure_defaults(&self) -> Result<bool, SettingsError> {
        let mut guard = self.settings.write().map_err(|_| SettingsError::Poisoned)?;
        if guard.is_some() {
            return Ok(false);
        }
        *guard = Some(LogSettings::default());
        Ok(true)
    }
}

/// Serde adapter storing a severity by its lowercase setting name.
///
/// Unknown names read back as `info`, the same fallback as the ingestion path.
mod level_name {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::severity::Severity;

    pub fn serialize<S: Serializer>(level: &Severity, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(level.setting_name())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Severity, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Severity::normalize(&name).0)
    }
}
