//! HTTP API module.
//!
//! The local server and the request/response types it exchanges with
//! browsers.

pub mod server;
pub mod types;

pub use server::{router, serve, start_server, AppState};
pub use types::*;
