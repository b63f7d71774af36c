//! Cross-window message bus.
//!
//! A completed authorization popup posts `{integration}_connected` to its
//! opener; a disconnect posts `integration_status_changed`. Here both travel
//! over a broadcast channel that any view can subscribe to.

use std::fmt;
use tokio::sync::broadcast;

use crate::models::Integration;

const CHANNEL_CAPACITY: usize = 32;

/// Message exchanged between the authorization popup and its opener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMessage {
    /// `{integration}_connected`
    Connected(Integration),
    /// `integration_status_changed`
    StatusChanged,
}

impl WindowMessage {
    pub const STATUS_CHANGED: &'static str = "integration_status_changed";

    /// Parse the wire form.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == Self::STATUS_CHANGED {
            return Some(Self::StatusChanged);
        }
        raw.strip_suffix("_connected")
            .and_then(Integration::from_name)
            .map(Self::Connected)
    }

    /// Whether this message concerns `integration`.
    pub fn concerns(&self, integration: Integration) -> bool {
        match self {
            Self::Connected(i) => *i == integration,
            Self::StatusChanged => true,
        }
    }
}

impl fmt::Display for WindowMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected(integration) => f.write_str(&integration.connected_message()),
            Self::StatusChanged => f.write_str(Self::STATUS_CHANGED),
        }
    }
}

/// Broadcast bus for [`WindowMessage`]s.
#[derive(Debug, Clone)]
pub struct MessageBus {
    sender: broadcast::Sender<WindowMessage>,
}

impl MessageBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, message: WindowMessage) {
        tracing::debug!(%message, "window message");
        let _ = self.sender.send(message);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WindowMessage> {
        self.sender.subscribe()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}
