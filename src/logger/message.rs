//! Log message payloads
//!
//! Callers may hand over plain text or structured data. Structured data is
//! rendered as YAML before it reaches the store, so the stored text stays
//! readable and still parses back to the submitted value.

use serde_json::Value;

/// Message submitted for ingestion
#[derive(Debug, Clone, PartialEq)]
pub enum LogMessage {
    Text(String),
    Structured(Value),
}

impl LogMessage {
    /// Text form as persisted in the log
    pub fn render(&self) -> String {
        match self {
            LogMessage::Text(text) => text.clone(),
            LogMessage::Structured(value) => render_value(value),
        }
    }
}

impl From<&str> for LogMessage {
    fn from(text: &str) -> Self {
        LogMessage::Text(text.to_string())
    }
}

impl From<String> for LogMessage {
    fn from(text: String) -> Self {
        LogMessage::Text(text)
    }
}

impl From<Value> for LogMessage {
    /// JSON strings stay text; everything else is structured
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => LogMessage::Text(text),
            other => LogMessage::Structured(other),
        }
    }
}

fn render_value(value: &Value) -> String {
    match serde_yaml::to_string(value) {
        Ok(yaml) => yaml.trim_end_matches('\n').to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to render structured message as YAML");
            value.to_string()
        }
    }
}
