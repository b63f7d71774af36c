//! Fixed-interval connection status poller.
//!
//! Each cycle fetches every integration's status in turn and writes it to
//! the [`StatusStore`]. A failed fetch is logged and leaves that
//! integration's previous entry in place; the cycle carries on with the rest.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::store::StatusStore;
use crate::config::DEFAULT_POLL_INTERVAL;
use crate::error::ClientResult;
use crate::models::{ConnectionInfo, ConnectionStatus, Integration, Session};

/// Where connection status comes from.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, integration: Integration, session: &Session) -> ClientResult<ConnectionInfo>;
}

/// Outcome of one polling cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollReport {
    /// Integrations fetched successfully.
    pub fetched: Vec<Integration>,
    /// Integrations whose fetch failed, with the error text.
    pub failed: Vec<(Integration, String)>,
}

/// Periodic status poller, the only writer of a [`StatusStore`].
pub struct Poller<S> {
    source: Arc<S>,
    store: StatusStore,
    session: Session,
    integrations: Vec<Integration>,
    interval: Duration,
    refresh: Arc<Notify>,
}

impl<S: StatusSource + 'static> Poller<S> {
    /// Poll every integration at the default interval.
    pub fn new(source: Arc<S>, store: StatusStore, session: Session) -> Self {
        Self {
            source,
            store,
            session,
            integrations: Integration::ALL.to_vec(),
            interval: DEFAULT_POLL_INTERVAL,
            refresh: Arc::new(Notify::new()),
        }
    }

    pub fn with_integrations(mut self, integrations: impl IntoIterator<Item = Integration>) -> Self {
        self.integrations = integrations.into_iter().collect();
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Share a refresh trigger with other tasks; notifying it runs a cycle
    /// immediately once the poller is spawned.
    pub fn with_refresh_trigger(mut self, refresh: Arc<Notify>) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    /// Run a single cycle.
    pub async fn poll_once(&self) -> PollReport {
        let mut report = PollReport::default();
        for &integration in &self.integrations {
            match self.source.fetch_status(integration, &self.session).await {
                Ok(info) => {
                    if self.store.set(integration, ConnectionStatus::from(info)) {
                        tracing::debug!(integration = integration.slug(), "status changed");
                    }
                    report.fetched.push(integration);
                }
                Err(e) => {
                    tracing::warn!(integration = integration.slug(), error = %e, "failed to fetch connection status");
                    report.failed.push((integration, e.to_string()));
                }
            }
        }
        report
    }

    /// Start polling in the background. The first cycle runs immediately.
    pub fn spawn(self) -> PollerHandle {
        let refresh = self.refresh.clone();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let trigger = refresh.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {}
                    _ = trigger.notified() => ticker.reset(),
                }
                self.poll_once().await;
            }
            tracing::debug!("status poller stopped");
        });

        PollerHandle {
            refresh,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Handle to a running poller. Dropping it cancels the poller.
#[derive(Debug)]
pub struct PollerHandle {
    refresh: Arc<Notify>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Run a cycle now instead of waiting for the next tick.
    pub fn refresh_now(&self) {
        self.refresh.notify_one();
    }

    /// Stop after the cycle in flight, if any.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
