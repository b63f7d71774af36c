//! Connection status: the shared store, the poller that writes it, and the
//! "connected for" formatter.
//!
//! ```text
//! ┌──────────────┐  fetch_status   ┌─────────┐  set   ┌─────────────┐
//! │ StatusSource │ ◄────────────── │ Poller  │ ─────► │ StatusStore │ ──► watch subscribers
//! └──────────────┘                 └─────────┘        └─────────────┘
//!                                       ▲ refresh_now()
//! ```

pub mod elapsed;
pub mod poller;
pub mod store;

pub use elapsed::{connected_for, format_elapsed};
pub use poller::{PollReport, Poller, PollerHandle, StatusSource};
pub use store::{StatusMap, StatusStore};
