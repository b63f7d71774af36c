//! Transient user notifications.
//!
//! Backend failures never abort a view; they surface here instead. A
//! [`Notifier`] broadcasts each [`Notification`] to every subscriber (the
//! terminal printer, the SSE stream of the local server) and mirrors it to
//! the log. Sending with no subscriber is fine.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::broadcast;

/// How long a notification stays on screen unless dismissed.
pub const AUTO_HIDE: Duration = Duration::from_millis(4000);

const CHANNEL_CAPACITY: usize = 100;

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Prefix used when printing to a terminal.
    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Success => "✅",
            Severity::Info => "ℹ️",
            Severity::Warning => "⚠️",
            Severity::Error => "❌",
        }
    }
}

/// A single dismissible notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
    /// Milliseconds before the notification hides itself.
    pub auto_hide_ms: u64,
}

impl Notification {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            auto_hide_ms: AUTO_HIDE.as_millis() as u64,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }
}

/// Broadcasts notifications to all subscribers.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish a notification.
    pub fn notify(&self, notification: Notification) {
        tracing::debug!(severity = ?notification.severity, "{}", notification.message);
        // No receivers is not an error.
        let _ = self.sender.send(notification);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notify(Notification::success(message));
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notify(Notification::info(message));
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.notify(Notification::warning(message));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(Notification::error(message));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_without_subscribers() {
        Notifier::new().error("nobody listening");
    }

    #[tokio::test]
    async fn test_subscribers_receive_in_order() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();
        notifier.info("Redirecting to Notion authorization...");
        notifier.success("Successfully connected to Notion!");

        let first = rx.recv().await.unwrap();
        assert_eq!(first.severity, Severity::Info);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.message, "Successfully connected to Notion!");
        assert_eq!(second.auto_hide_ms, 4000);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(Notification::warning("careful")).unwrap();
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["autoHideMs"], 4000);
    }
}
