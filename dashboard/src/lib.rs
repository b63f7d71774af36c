//! # Dataport - browse and export records from OAuth-connected integrations
//!
//! Dataport talks to an integrations backend that holds Notion, HubSpot and
//! Airtable connections. It runs the OAuth connect flow, polls connection
//! status, loads records and projects them into tables or CSV exports.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Backend   │────▶│  ApiClient  │────▶│   Records   │────▶│ TableView / │
//! │ (OAuth, DB) │     │  (reqwest)  │     │   (JSON)    │     │  CSV export │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!                            │
//!                            ▼
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │   Poller    │────▶│ StatusStore │────▶ CLI / SSE
//!                     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dataport::{project, Config, Dashboard, Integration};
//!
//! #[tokio::main]
//! async fn main() {
//!     let dashboard = Dashboard::new(Config::from_env().unwrap());
//!     dashboard.refresh_status().await;
//!     dashboard.load(Integration::Notion, false).await.unwrap();
//!     println!("{} rows", dashboard.table(Integration::Notion).rows.len());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per concern
//! - [`models`] - Integrations, sessions, connection status
//! - [`table`] - Column inference, classification, cell rendering
//! - [`export`] - Export flattening and CSV writing
//! - [`client`] - Integrations backend client
//! - [`status`] - Status store and poller
//! - [`oauth`] - OAuth popup flow and message bus
//! - [`notify`] - Transient notifications
//! - [`dashboard`] - Presentation context and data views
//! - [`render`] - Terminal rendering
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Projection
pub mod export;
pub mod table;

// Backend
pub mod client;
pub mod oauth;
pub mod status;

// Presentation
pub mod dashboard;
pub mod notify;
pub mod render;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ClientError,
    ConfigError,
    ConnectError,
    DashboardError,
    DashboardResult,
    ExportError,
    ServerError,
};

// =============================================================================
// Re-exports - Models and configuration
// =============================================================================

pub use config::Config;
pub use models::{
    ConnectionInfo,
    ConnectionStatus,
    HubspotObject,
    Integration,
    Session,
};

// =============================================================================
// Re-exports - Table projection
// =============================================================================

pub use table::{
    classify,
    infer_columns,
    project,
    render_cell,
    Cell,
    ColumnSpec,
    SemanticCategory,
    TableView,
};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{export_projection, export_to_bytes, export_to_dir, write_csv};

// =============================================================================
// Re-exports - Backend, status and OAuth
// =============================================================================

pub use client::{ApiClient, LoadOptions};
pub use oauth::{connect, ConnectContext, MessageBus, PopupLauncher, TerminalLauncher, WindowMessage};
pub use status::{format_elapsed, Poller, PollerHandle, StatusSource, StatusStore};

// =============================================================================
// Re-exports - Presentation
// =============================================================================

pub use dashboard::{Dashboard, DataView, LiveStatus};
pub use notify::{Notification, Notifier, Severity};

// Server
pub mod server {
    pub use crate::api::server::{start_server, AppState};
}
