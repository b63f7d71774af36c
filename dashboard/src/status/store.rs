//! Shared per-integration connection status.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;

use crate::models::{ConnectionStatus, Integration};

/// Mapping from integration to its last known status.
pub type StatusMap = BTreeMap<Integration, ConnectionStatus>;

/// Connection status shared by every view.
///
/// Cloning is cheap; clones share the same state. Readers take snapshots or
/// subscribe; only the [`Poller`](super::Poller) writes.
#[derive(Debug, Clone)]
pub struct StatusStore {
    sender: Arc<watch::Sender<StatusMap>>,
}

impl StatusStore {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(StatusMap::new());
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Copy of the current mapping.
    pub fn snapshot(&self) -> StatusMap {
        self.sender.borrow().clone()
    }

    pub fn get(&self, integration: Integration) -> Option<ConnectionStatus> {
        self.sender.borrow().get(&integration).cloned()
    }

    pub fn is_connected(&self, integration: Integration) -> bool {
        self.sender
            .borrow()
            .get(&integration)
            .map(|s| s.connected)
            .unwrap_or(false)
    }

    /// Credentials of a connected integration.
    pub fn credentials(&self, integration: Integration) -> Option<Value> {
        self.sender
            .borrow()
            .get(&integration)
            .filter(|s| s.connected)
            .and_then(|s| s.credentials.clone())
    }

    /// Receiver notified whenever the mapping changes.
    pub fn subscribe(&self) -> watch::Receiver<StatusMap> {
        self.sender.subscribe()
    }

    /// Record one integration's status. Subscribers are only woken when the
    /// entry actually changed. Returns whether it did.
    pub(crate) fn set(&self, integration: Integration, status: ConnectionStatus) -> bool {
        self.sender.send_if_modified(|map| {
            if map.get(&integration) == Some(&status) {
                return false;
            }
            map.insert(integration, status);
            true
        })
    }
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new()
    }
}
