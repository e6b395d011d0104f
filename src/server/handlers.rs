//! Admin API route handlers
//!
//! The suite log and the settings file sit behind synchronous I/O that can
//! wait on a locked database, so every call into them runs on the blocking
//! pool and the async workers stay free.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use super::error::ApiError;
use super::AppState;
use crate::logger::{LogMessage, RecordOutcome, DEFAULT_LEVEL};
use crate::settings::LogSettings;
use crate::store::{LogEvent, DEFAULT_FETCH_LIMIT};
use crate::suite::PluginStatus;

/// Body of `POST /api/log`
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub source: String,
    /// Text, or any JSON value to be stored as YAML
    pub message: Value,
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    DEFAULT_LEVEL.to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    /// `stored`, `filtered` or `failed`
    pub outcome: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl From<RecordOutcome> for IngestResponse {
    fn from(outcome: RecordOutcome) -> Self {
        match outcome {
            RecordOutcome::Stored(id) => Self {
                outcome: "stored".to_string(),
                id: Some(id),
            },
            RecordOutcome::Filtered => Self {
                outcome: "filtered".to_string(),
                id: None,
            },
            RecordOutcome::Failed => Self {
                outcome: "failed".to_string(),
                id: None,
            },
        }
    }
}

/// Query string of `GET /api/logs`
#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<usize>,
}

/// Body of `DELETE /api/logs`
#[derive(Debug, Default, Deserialize)]
pub struct ClearRequest {
    #[serde(default)]
    pub confirm: bool,
}

/// Body of `PUT /api/settings`, as submitted by the settings form
#[derive(Debug, Deserialize)]
pub struct SettingsForm {
    #[serde(default)]
    pub log_level: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SettingsView {
    pub log_level: String,
}

impl From<LogSettings> for SettingsView {
    fn from(settings: LogSettings) -> Self {
        Self {
            log_level: settings.minimum_level().to_string(),
        }
    }
}

/// Run synchronous store or settings work off the async workers
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        error!(error = %e, "Blocking admin task failed");
        ApiError::internal("admin task did not complete")
    })?
}

/// POST /api/log
///
/// Always answers 202: a rejected or failed write is reported in the body,
/// never as an HTTP error, so callers can fire and forget.
pub async fn ingest(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> (StatusCode, Json<IngestResponse>) {
    debug!(source = %request.source, log_level = %request.level, "Received log event");

    let logger = state.logger.clone();
    let outcome = blocking(move || {
        Ok(logger.record(
            &request.source,
            LogMessage::from(request.message),
            &request.level,
        ))
    })
    .await
    .unwrap_or(RecordOutcome::Failed);
    (StatusCode::ACCEPTED, Json(outcome.into()))
}

/// GET /api/logs
pub async fn recent_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Vec<LogEvent>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_FETCH_LIMIT);
    let logger = state.logger.clone();
    let events = blocking(move || Ok(logger.fetch_recent(limit)?)).await?;
    Ok(Json(events))
}

/// DELETE /api/logs
///
/// Destructive; refuses to run without `"confirm": true`.
pub async fn clear_logs(
    State(state): State<AppState>,
    Json(request): Json<ClearRequest>,
) -> Result<Json<Value>, ApiError> {
    if !request.confirm {
        return Err(ApiError::bad_request(
            "clearing the suite log requires \"confirm\": true",
        ));
    }

    let logger = state.logger.clone();
    blocking(move || Ok(logger.clear()?)).await?;
    Ok(Json(serde_json::json!({ "status": "cleared" })))
}

/// GET /api/settings
pub async fn get_settings(State(state): State<AppState>) -> Result<Json<SettingsView>, ApiError> {
    let settings = state.settings.clone();
    let current = blocking(move || Ok(settings.load()?)).await?;
    Ok(Json(current.into()))
}

/// PUT /api/settings
///
/// Unknown levels are saved as `info` rather than rejected.
pub async fn save_settings(
    State(state): State<AppState>,
    Json(form): Json<SettingsForm>,
) -> Result<Json<SettingsView>, ApiError> {
    let settings = LogSettings::sanitize(form.log_level.as_deref());
    let store = state.settings.clone();
    blocking(move || Ok(store.save(&settings)?)).await?;
    info!(log_level = settings.minimum_level(), "Log settings saved");
    Ok(Json(settings.into()))
}

/// GET /api/status
pub async fn suite_status(State(state): State<AppState>) -> Json<Vec<PluginStatus>> {
    Json(state.registry.status())
}
