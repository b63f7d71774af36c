//! HTTP server for the Dataport dashboard.
//!
//! Exposes the status store, the notification stream and the table/export
//! projections to a browser.
//!
//! # API Endpoints
//!
//! | Method | Path                   | Description                          |
//! |--------|------------------------|--------------------------------------|
//! | GET    | `/health`              | Health check                         |
//! | GET    | `/api/status`          | Connection status of every integration |
//! | GET    | `/api/status/stream`   | SSE stream of status changes         |
//! | GET    | `/api/notifications`   | SSE stream of notifications          |
//! | POST   | `/api/table`           | Records → one page of a table view   |
//! | POST   | `/api/export`          | Records → CSV download               |

use axum::{
    extract::{Query, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, sse::KeepAlive, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio::net::TcpListener;
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::types::{error_response, records_from_body, status_entries, ExportQuery, PageQuery, StatusEntry, TableResponse};
use crate::dashboard::Dashboard;
use crate::error::{ExportError, ServerError};
use crate::export::{export_file_name, export_to_bytes};
use crate::notify::Notifier;
use crate::status::StatusStore;
use crate::table::project;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: StatusStore,
    pub notifier: Notifier,
    pub page_size: usize,
}

impl AppState {
    pub fn from_dashboard(dashboard: &Dashboard) -> Self {
        Self {
            store: dashboard.store().clone(),
            notifier: dashboard.notifier().clone(),
            page_size: dashboard.config().page_size,
        }
    }
}

/// Build the router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/status", get(status))
        .route("/api/status/stream", get(sse_status))
        .route("/api/notifications", get(sse_notifications))
        .route("/api/table", post(table))
        .route("/api/export", post(export))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on `port` and run until Ctrl-C.
pub async fn start_server(state: AppState, port: u16) -> Result<(), ServerError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    println!("🚀 Dataport server running on http://localhost:{}", port);
    println!("   GET  /api/status          - Connection status");
    println!("   GET  /api/status/stream   - SSE status stream");
    println!("   GET  /api/notifications   - SSE notification stream");
    println!("   POST /api/table           - Records to table view");
    println!("   POST /api/export          - Records to CSV");
    println!("   GET  /health              - Health check");
    println!();

    serve(listener, state, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` completes.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<(), ServerError>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    tracing::info!(addr = ?listener.local_addr().ok(), "serving");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "dataport",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "status": "GET /api/status",
            "statusStream": "GET /api/status/stream (SSE)",
            "notifications": "GET /api/notifications (SSE)",
            "table": "POST /api/table",
            "export": "POST /api/export"
        }
    }))
}

async fn status(State(state): State<AppState>) -> Json<Vec<StatusEntry>> {
    Json(status_entries(&state.store.snapshot(), Utc::now()))
}

/// SSE endpoint: the current status, then every change.
async fn sse_status(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = WatchStream::new(state.store.subscribe()).filter_map(|statuses| {
        let json = serde_json::to_string(&status_entries(&statuses, Utc::now())).ok()?;
        Some(Ok(Event::default().event("status").data(json)))
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("keep-alive"))
}

/// SSE endpoint for notifications
async fn sse_notifications(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.notifier.subscribe()).filter_map(|result| match result {
        Ok(notification) => {
            let json = serde_json::to_string(&notification).ok()?;
            Some(Ok(Event::default().event("notification").data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("keep-alive"))
}

async fn table(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
    Json(body): Json<Value>,
) -> Result<Json<TableResponse>, ServerError> {
    let records = records_from_body(body).map_err(ServerError::BadRequest)?;
    let view = project(&records);
    Ok(Json(TableResponse::from_view(view, query, state.page_size)))
}

async fn export(Query(query): Query<ExportQuery>, Json(body): Json<Value>) -> Result<Response, ServerError> {
    let records = records_from_body(body).map_err(ServerError::BadRequest)?;
    let bytes = export_to_bytes(&records)?;

    let label = query.label.as_deref().unwrap_or("Records");
    let disposition = format!("attachment; filename=\"{}\"", export_file_name(&sanitize_label(label)));
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BadRequest(_) | ServerError::Export(ExportError::NothingToExport) => StatusCode::BAD_REQUEST,
            _ => {
                tracing::error!(error = %self, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(error_response(&self.to_string()))).into_response()
    }
}

/// Keep labels safe inside a quoted header value and a file name.
fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
