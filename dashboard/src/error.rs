//! Error types for the Dataport client.
//!
//! One error type per concern, joined by a top-level [`DashboardError`]:
//!
//! - [`ClientError`] - backend HTTP calls
//! - [`ConnectError`] - OAuth popup flow
//! - [`ExportError`] - spreadsheet export
//! - [`ConfigError`] - environment configuration
//! - [`ServerError`] - local HTTP surface
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Backend Client Errors
// =============================================================================

/// Errors from calls to the integrations backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response (connection refused, timeout...).
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The backend answered with a non-success status.
    #[error("Backend returned {status}: {}", detail.as_deref().unwrap_or("no detail"))]
    Status { status: u16, detail: Option<String> },

    /// The body could not be decoded into the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// The `detail` message the backend attached to an error response, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ClientError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::InvalidResponse(err.to_string())
        } else {
            ClientError::Http(err.to_string())
        }
    }
}

// =============================================================================
// OAuth Connect Errors
// =============================================================================

/// Errors from the OAuth connect flow.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Backend call failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The authorization window could not be opened.
    #[error("Failed to open authorization window")]
    PopupBlocked,
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while writing a spreadsheet export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// No records loaded.
    #[error("Nothing to export: no records loaded")]
    NothingToExport,

    /// Failed to write the file.
    #[error("Export IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable holds a value of the wrong shape.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

// =============================================================================
// Server Errors
// =============================================================================

/// Local HTTP surface errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind or serve.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Export failed while answering a request.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

// =============================================================================
// Dashboard Errors (top-level)
// =============================================================================

/// Top-level error returned by the [`crate::dashboard::Dashboard`] and the CLI.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Connect error: {0}")]
    Connect(#[from] ConnectError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    /// The integration has no stored credentials to load data with.
    #[error("{0} is not connected")]
    NotConnected(String),

    /// A records file did not hold a JSON array.
    #[error("Invalid records: {0}")]
    InvalidRecords(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for backend calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type for the connect flow.
pub type ConnectResult<T> = Result<T, ConnectError>;

/// Result type for exports.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for dashboard operations.
pub type DashboardResult<T> = Result<T, DashboardError>;
