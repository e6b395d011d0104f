//! Suite status registry
//!
//! Tracks the plugins that make up the suite and, for each one, an optional
//! metrics provider. The dashboard summary for a plugin comes from its
//! provider, so adding a plugin never means touching a central match.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// A plugin known to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Plugin declared in the config file, with optional fixed metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfig {
    #[serde(flatten)]
    pub info: PluginInfo,
    /// Label -> value, e.g. `Plays = 12`
    #[serde(default)]
    pub metrics: BTreeMap<String, u64>,
}

/// A single counted quantity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub label: String,
    pub value: u64,
}

impl Metric {
    pub fn new(label: impl Into<String>, value: u64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Something that can report metrics for one plugin.
///
/// An `Err` carries a short status message shown in place of the metrics.
pub trait MetricsProvider: Send + Sync {
    fn metrics(&self) -> Result<Vec<Metric>, String>;
}

/// Provider returning a fixed list
#[derive(Debug, Clone, Default)]
pub struct StaticMetrics(pub Vec<Metric>);

impl MetricsProvider for StaticMetrics {
    fn metrics(&self) -> Result<Vec<Metric>, String> {
        Ok(self.0.clone())
    }
}

/// One row of the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginStatus {
    pub name: String,
    pub version: String,
    pub active: bool,
    pub summary: String,
}

const INACTIVE_SUMMARY: &str = "Plugin is not active.";
const NO_METRICS_SUMMARY: &str = "No metrics available.";

/// Registry of suite plugins and their metrics providers
pub struct SuiteRegistry {
    prefix: String,
    plugins: Vec<PluginInfo>,
    providers: HashMap<String, Box<dyn MetricsProvider>>,
}

impl SuiteRegistry {
    /// Empty registry; only plugins whose name starts with `prefix` are reported
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            plugins: Vec::new(),
            providers: HashMap::new(),
        }
    }

    /// Build a registry from config-declared plugins
    pub fn from_plugins(prefix: impl Into<String>, plugins: &[PluginConfig]) -> Self {
        let mut registry = Self::new(prefix);
        for plugin in plugins {
            registry.register_plugin(plugin.info.clone());
            if !plugin.metrics.is_empty() {
                let metrics = plugin
                    .metrics
                    .iter()
                    .map(|(label, value)| Metric::new(label.clone(), *value))
                    .collect();
                registry.register_provider(&plugin.info.name, StaticMetrics(metrics));
            }
        }
        registry
    }

    /// Add or replace a plugin by name
    pub fn register_plugin(&mut self, plugin: PluginInfo) {
        match self.plugins.iter_mut().find(|p| p.name == plugin.name) {
            Some(existing) => *existing = plugin,
            None => self.plugins.push(plugin),
        }
    }

    /// Attach a metrics provider to a plugin name
    pub fn register_provider(&mut self, name: &str, provider: impl MetricsProvider + 'static) {
        self.providers.insert(name.to_string(), Box::new(provider));
    }

    /// Suite plugins in registration order
    pub fn suite_plugins(&self) -> impl Iterator<Item = &PluginInfo> {
        self.plugins
            .iter()
            .filter(move |p| p.name.starts_with(&self.prefix))
    }

    /// Dashboard rows for every suite plugin
    pub fn status(&self) -> Vec<PluginStatus> {
        self.suite_plugins()
            .map(|plugin| PluginStatus {
                name: plugin.name.clone(),
                version: plugin.version.clone(),
                active: plugin.active,
                summary: self.summary(plugin),
            })
            .collect()
    }

    fn summary(&self, plugin: &PluginInfo) -> String {
        if !plugin.active {
            return INACTIVE_SUMMARY.to_string();
        }

        let Some(provider) = self.providers.get(&plugin.name) else {
            return NO_METRICS_SUMMARY.to_string();
        };

        match provider.metrics() {
            Ok(metrics) if metrics.is_empty() => NO_METRICS_SUMMARY.to_string(),
            Ok(metrics) => metrics
                .iter()
                .map(|m| format!("{} {}", m.value, m.label))
                .collect::<Vec<_>>()
                .join(" | "),
            Err(message) => message,
        }
    }
}
