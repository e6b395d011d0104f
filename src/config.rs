//! Configuration management for the Status Center

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::suite::PluginConfig;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Port for the admin HTTP server (bound to loopback)
    #[serde(default = "default_admin_port")]
    pub admin_port: u16,

    /// SQLite database holding the suite log
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Name prefix that marks a plugin as part of the suite (default: "TW ")
    #[serde(default = "default_suite_prefix")]
    pub suite_prefix: String,

    /// Plugins shown on the status dashboard
    #[serde(default)]
    pub plugins: Vec<PluginConfig>,
}

fn default_admin_port() -> u16 {
    9797
}

fn default_database_path() -> PathBuf {
    config_dir().join("suite_logs.db")
}

fn default_suite_prefix() -> String {
    "TW ".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            admin_port: default_admin_port(),
            database_path: default_database_path(),
            suite_prefix: default_suite_prefix(),
            plugins: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }
}

/// Get the base configuration directory (~/.status-center)
/// Falls back to ./.status-center if home directory cannot be determined
pub fn config_dir() -> PathBuf {
    try_config_dir().unwrap_or_else(|| {
        tracing::warn!("Could not determine home directory, using current directory for config");
        PathBuf::from(".status-center")
    })
}

/// Try to get the base configuration directory, returning None if home dir is unavailable
pub fn try_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".status-center"))
}

/// Get the path to the config file
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Get the path to the persisted log settings
pub fn settings_file_path() -> PathBuf {
    config_dir().join("settings.toml")
}

/// Get the path to the diagnostics directory
pub fn logs_dir() -> PathBuf {
    config_dir().join("logs")
}

/// Ensure all required directories exist
pub fn ensure_directories(config: &Config) -> Result<()> {
    std::fs::create_dir_all(config_dir()).context("Failed to create config directory")?;

    if let Some(parent) = config.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }
    }

    std::fs::create_dir_all(logs_dir()).context("Failed to create logs directory")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.admin_port, 9797);
        assert_eq!(config.suite_prefix, "TW ");
        assert!(config.database_path.ends_with("suite_logs.db"));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.admin_port, parsed.admin_port);
        assert_eq!(config.database_path, parsed.database_path);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: Config = toml::from_str("admin_port = 8080").unwrap();
        assert_eq!(parsed.admin_port, 8080);
        assert_eq!(parsed.suite_prefix, "TW ");
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_from(&temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(config.admin_port, 9797);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.admin_port = 1234;
        config.suite_prefix = "ACME ".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.admin_port, 1234);
        assert_eq!(loaded.suite_prefix, "ACME ");
    }

    #[test]
    fn test_plugins_section() {
        let parsed: Config = toml::from_str(
            r#"
            [[plugins]]
            name = "TW Plays"
            version = "1.4.0"
            metrics = { Plays = 12 }
            "#,
        )
        .unwrap();

        assert_eq!(parsed.plugins.len(), 1);
        assert_eq!(parsed.plugins[0].info.name, "TW Plays");
        assert!(parsed.plugins[0].info.active);
        assert_eq!(parsed.plugins[0].metrics.get("Plays"), Some(&12));
    }

    #[test]
    fn test_load_invalid_file_errors() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "admin_port = \"not a port\"").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_config_dir_does_not_panic() {
        let dir = config_dir();
        assert!(dir.ends_with(".status-center"));
    }

    #[test]
    fn test_settings_and_logs_live_under_config_dir() {
        assert!(settings_file_path().starts_with(config_dir()));
        assert!(logs_dir().starts_with(config_dir()));
    }
}
