//! Admin HTTP server
//!
//! Loopback JSON API through which suite components submit events and an
//! operator reads, clears and configures the suite log.
//!
//! | Route           | Method | Purpose                                  |
//! |-----------------|--------|------------------------------------------|
//! | `/api/log`      | POST   | Ingest one event                         |
//! | `/api/logs`     | GET    | Most recent events (`?limit=`, max 200)  |
//! | `/api/logs`     | DELETE | Clear the log (`{"confirm": true}`)      |
//! | `/api/settings` | GET    | Current minimum level                    |
//! | `/api/settings` | PUT    | Save a new minimum level                 |
//! | `/api/status`   | GET    | Suite plugin status rows                 |

mod error;
pub mod handlers;

pub use error::ApiError;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tokio::sync::oneshot;
use tracing::info;

use crate::logger::SuiteLogger;
use crate::settings::SettingsStore;
use crate::suite::SuiteRegistry;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub logger: Arc<SuiteLogger>,
    pub settings: Arc<dyn SettingsStore>,
    pub registry: Arc<SuiteRegistry>,
}

impl AppState {
    pub fn new(
        logger: Arc<SuiteLogger>,
        settings: Arc<dyn SettingsStore>,
        registry: Arc<SuiteRegistry>,
    ) -> Self {
        Self {
            logger,
            settings,
            registry,
        }
    }
}

/// Handle to control the running server
pub struct ServerHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    addr: SocketAddr,
}

impl ServerHandle {
    /// Get the address the server is listening on
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Shutdown the server gracefully
    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            // Receiver is gone if the server already stopped
            let _ = tx.send(());
        }
    }
}

/// Build the admin router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/log", post(handlers::ingest))
        .route(
            "/api/logs",
            get(handlers::recent_logs).delete(handlers::clear_logs),
        )
        .route(
            "/api/settings",
            get(handlers::get_settings).put(handlers::save_settings),
        )
        .route("/api/status", get(handlers::suite_status))
        .with_state(state)
}

/// Start the admin server on 127.0.0.1:`port`
///
/// Port 0 picks a free port; see [`ServerHandle::addr`].
pub async fn start(port: u16, state: AppState) -> Result<ServerHandle> {
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind admin server to {}", addr))?;
    let bound_addr = listener.local_addr()?;

    info!("Admin server listening on {}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
                info!("Admin server shutting down");
            })
            .await
            .ok();
    });

    Ok(ServerHandle {
        shutdown_tx: Some(shutdown_tx),
        addr: bound_addr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemorySettingsStore;
    use crate::severity::Severity;
    use crate::store::{LogBackend, LogEvent, MemoryLogStore, NewLogEvent, StoreError};
    use crate::suite::{Metric, PluginInfo, StaticMetrics};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::Value;
    use std::time::{Duration, Instant};
    use tower::ServiceExt;

    /// Backend that holds every write as long as a locked database would
    struct SlowStore {
        inner: MemoryLogStore,
        delay: Duration,
    }

    impl LogBackend for SlowStore {
        fn append(&self, event: NewLogEvent) -> Result<LogEvent, StoreError> {
            std::thread::sleep(self.delay);
            self.inner.append(event)
        }

        fn fetch_recent(&self, limit: usize) -> Result<Vec<LogEvent>, StoreError> {
            self.inner.fetch_recent(limit)
        }

        fn clear(&self) -> Result<(), StoreError> {
            self.inner.clear()
        }

        fn count(&self) -> Result<usize, StoreError> {
            self.inner.count()
        }
    }

    struct TestApp {
        state: AppState,
        store: Arc<MemoryLogStore>,
    }

    fn test_app(minimum: Severity) -> TestApp {
        let store = Arc::new(MemoryLogStore::new());
        let settings: Arc<dyn SettingsStore> = Arc::new(MemorySettingsStore::with_level(minimum));
        let logger = Arc::new(SuiteLogger::new(store.clone(), settings.clone()));

        let mut registry = SuiteRegistry::new("TW ");
        registry.register_plugin(PluginInfo {
            name: "TW Calendar".to_string(),
            version: "1.2.0".to_string(),
            active: true,
        });
        registry.register_provider("TW Calendar", StaticMetrics(vec![Metric::new("Events", 8)]));

        TestApp {
            state: AppState::new(logger, settings, Arc::new(registry)),
            store,
        }
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_ingest_stores_event() {
        let app = test_app(Severity::Warning);

        let response = router(app.state.clone())
            .oneshot(json_request(
                "POST",
                "/api/log",
                r#"{"source":"TW Forms","message":"hello","level":"ERROR"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = body_json(response).await;
        assert_eq!(body["outcome"], "stored");
        assert_eq!(app.store.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ingest_below_minimum_is_filtered() {
        let app = test_app(Severity::Warning);

        let response = router(app.state.clone())
            .oneshot(json_request(
                "POST",
                "/api/log",
                r#"{"source":"TW Forms","message":"chatter","level":"DEBUG"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(body_json(response).await["outcome"], "filtered");
        assert_eq!(app.store.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ingest_defaults_level_and_renders_structured() {
        let app = test_app(Severity::Info);

        let response = router(app.state.clone())
            .oneshot(json_request(
                "POST",
                "/api/log",
                r#"{"source":"TW Plays","message":{"play":"Hamlet","seats":120}}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let events = app.store.fetch_recent(1).unwrap();
        assert_eq!(events[0].level, Severity::Info);
        assert_eq!(events[0].message, "play: Hamlet\nseats: 120");
    }

    #[tokio::test]
    async fn test_slow_store_does_not_stall_other_tasks() {
        let store = Arc::new(SlowStore {
            inner: MemoryLogStore::new(),
            delay: Duration::from_millis(500),
        });
        let settings: Arc<dyn SettingsStore> = Arc::new(MemorySettingsStore::new());
        let logger = Arc::new(SuiteLogger::new(store.clone(), settings.clone()));
        let state = AppState::new(logger, settings, Arc::new(SuiteRegistry::new("TW ")));

        // Single-threaded runtime: a handler blocking in place would hold the timer back
        let started = Instant::now();
        let ingest = tokio::spawn(router(state).oneshot(json_request(
            "POST",
            "/api/log",
            r#"{"source":"TW Forms","message":"slow","level":"ERROR"}"#,
        )));
        tokio::time::sleep(Duration::from_millis(10)).await;
        let timer_fired_after = started.elapsed();

        let response = ingest.await.unwrap().unwrap();
        assert!(
            timer_fired_after < Duration::from_millis(250),
            "timer fired after {:?}",
            timer_fired_after
        );
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(body_json(response).await["outcome"], "stored");
        assert_eq!(store.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ingest_missing_source_is_rejected() {
        let app = test_app(Severity::Info);

        let response = router(app.state)
            .oneshot(json_request("POST", "/api/log", r#"{"message":"x"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_recent_logs_newest_first_with_limit() {
        let app = test_app(Severity::Debug);
        for i in 0..5 {
            app.state
                .logger
                .log("TW Scripts", format!("scan {}", i), "INFO");
        }

        let response = router(app.state.clone())
            .oneshot(get_request("/api/logs?limit=2"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let events: Vec<LogEvent> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].message, "scan 4");
        assert_eq!(events[1].message, "scan 3");
    }

    #[tokio::test]
    async fn test_clear_requires_confirmation() {
        let app = test_app(Severity::Info);
        app.state.logger.log("TW Forms", "keep me", "ERROR");

        let response = router(app.state.clone())
            .oneshot(json_request("DELETE", "/api/logs", r#"{"confirm":false}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["status"], "error");
        assert_eq!(app.store.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_clear_with_confirmation() {
        let app = test_app(Severity::Info);
        app.state.logger.log("TW Forms", "gone", "ERROR");

        for _ in 0..2 {
            let response = router(app.state.clone())
                .oneshot(json_request("DELETE", "/api/logs", r#"{"confirm":true}"#))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        assert_eq!(app.store.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_settings_round_trip_and_sanitize() {
        let app = test_app(Severity::Info);

        let response = router(app.state.clone())
            .oneshot(json_request(
                "PUT",
                "/api/settings",
                r#"{"log_level":"error"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["log_level"], "error");

        let response = router(app.state.clone())
            .oneshot(json_request(
                "PUT",
                "/api/settings",
                r#"{"log_level":"everything"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["log_level"], "info");

        let response = router(app.state.clone())
            .oneshot(get_request("/api/settings"))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["log_level"], "info");
    }

    #[tokio::test]
    async fn test_saved_settings_gate_ingestion() {
        let app = test_app(Severity::Info);

        router(app.state.clone())
            .oneshot(json_request(
                "PUT",
                "/api/settings",
                r#"{"log_level":"error"}"#,
            ))
            .await
            .unwrap();
        app.state.logger.log("TW Forms", "warned", "WARNING");

        assert_eq!(app.store.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_suite_status() {
        let app = test_app(Severity::Info);

        let response = router(app.state)
            .oneshot(get_request("/api/status"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body[0]["name"], "TW Calendar");
        assert_eq!(body[0]["summary"], "8 Events");
    }

    #[tokio::test]
    async fn test_server_starts_and_shuts_down() {
        let app = test_app(Severity::Info);

        let handle = start(0, app.state).await.unwrap();
        let addr = handle.addr();
        assert!(addr.port() > 0);
        assert!(tokio::net::TcpStream::connect(addr).await.is_ok());

        handle.shutdown();
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        assert!(tokio::net::TcpStream::connect(addr).await.is_err());
    }
}
