//! OAuth connect flow.
//!
//! ```text
//! authorize ──▶ open popup ──▶ watch until closed ──▶ credentials ──▶ notify + publish
//!                                  │
//!                                  └─ `{integration}_connected` on the bus ──▶ refresh status
//! ```
//!
//! Every backend failure is reported through the [`Notifier`] and returned;
//! none of them is fatal to the caller. Dropping the returned future stops
//! the popup watch.

pub mod bus;
pub mod popup;

use serde_json::Value;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Notify;

pub use bus::{MessageBus, WindowMessage};
pub use popup::{FlagPopup, Popup, PopupLauncher, TerminalLauncher};

use crate::client::ApiClient;
use crate::config::POPUP_CHECK_INTERVAL;
use crate::error::{ConnectError, ConnectResult};
use crate::models::{Integration, Session};
use crate::notify::Notifier;

/// Everything the connect flow talks to.
#[derive(Clone, Copy)]
pub struct ConnectContext<'a> {
    pub client: &'a ApiClient,
    pub session: &'a Session,
    pub notifier: &'a Notifier,
    pub bus: &'a MessageBus,
    /// Notified to refresh connection status.
    pub refresh: &'a Notify,
    pub check_interval: Duration,
}

impl<'a> ConnectContext<'a> {
    pub fn new(
        client: &'a ApiClient,
        session: &'a Session,
        notifier: &'a Notifier,
        bus: &'a MessageBus,
        refresh: &'a Notify,
    ) -> Self {
        Self {
            client,
            session,
            notifier,
            bus,
            refresh,
            check_interval: POPUP_CHECK_INTERVAL,
        }
    }

    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }
}

/// Connect `integration`, returning the credentials the backend stored.
pub async fn connect(
    ctx: &ConnectContext<'_>,
    integration: Integration,
    launcher: &dyn PopupLauncher,
) -> ConnectResult<Value> {
    let name = integration.display_name();

    let url = match ctx.client.authorize(integration, ctx.session).await {
        Ok(url) => url,
        Err(e) => {
            let message = e
                .detail()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Failed to connect to {}", name));
            ctx.notifier.error(message);
            return Err(e.into());
        }
    };

    ctx.notifier.info(format!("Redirecting to {} authorization...", name));
    let Some(popup) = launcher.open(&url) else {
        ctx.notifier.error("Failed to open authorization window");
        return Err(ConnectError::PopupBlocked);
    };

    watch_popup(ctx, integration, popup.as_ref()).await;
    drop(popup);

    match ctx.client.credentials(integration, ctx.session).await {
        Ok(credentials) => {
            ctx.notifier.success(format!("Successfully connected to {}!", name));
            ctx.bus.publish(WindowMessage::Connected(integration));
            Ok(credentials)
        }
        Err(e) => {
            ctx.notifier.error(format!("Failed to get {} credentials", name));
            Err(e.into())
        }
    }
}

/// Wait until `popup` is closed. While waiting, a connected message for this
/// integration triggers a status refresh. The bus subscription ends with the
/// watch.
async fn watch_popup(ctx: &ConnectContext<'_>, integration: Integration, popup: &dyn Popup) {
    let mut messages = ctx.bus.subscribe();
    let mut listening = true;
    let mut ticker = tokio::time::interval(ctx.check_interval);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if popup.is_closed() {
                    tracing::debug!(integration = integration.slug(), "authorization window closed");
                    break;
                }
            }
            message = messages.recv(), if listening => match message {
                Ok(WindowMessage::Connected(i)) if i == integration => {
                    tracing::debug!(integration = integration.slug(), "connected message received");
                    ctx.refresh.notify_one();
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => listening = false,
            },
        }
    }
}
