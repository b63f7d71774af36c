//! Presentation context wiring the client, status store, poller, message
//! bus and notifications, plus the per-integration data views.
//!
//! Backend failures surface as notifications and are returned to the
//! caller, which may ignore them; the view itself keeps working.

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::client::{ApiClient, LoadOptions};
use crate::config::Config;
use crate::error::{ConnectResult, DashboardError, DashboardResult};
use crate::export::export_to_dir;
use crate::models::{HubspotObject, Integration, Session};
use crate::notify::Notifier;
use crate::oauth::{self, ConnectContext, MessageBus, PopupLauncher, WindowMessage};
use crate::status::{PollReport, Poller, PollerHandle, StatusStore};
use crate::table::{project, TableView};

// =============================================================================
// Data view
// =============================================================================

/// Loaded data of one integration.
#[derive(Debug, Clone, PartialEq)]
pub struct DataView {
    pub integration: Integration,
    /// Object type of HubSpot loads.
    pub hubspot_object: HubspotObject,
    /// `None` until a load completes.
    pub records: Option<Vec<Value>>,
}

impl DataView {
    pub fn new(integration: Integration) -> Self {
        Self {
            integration,
            hubspot_object: HubspotObject::default(),
            records: None,
        }
    }

    pub fn records(&self) -> &[Value] {
        self.records.as_deref().unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.records = None;
    }

    pub fn table(&self) -> TableView {
        project(self.records())
    }

    /// Summary line shown under the load buttons, once something was loaded.
    pub fn summary(&self) -> Option<String> {
        self.records.as_ref().map(|records| {
            if records.is_empty() {
                "Did not find any data for this search request".to_string()
            } else {
                format!("Loaded Items: {} items loaded", records.len())
            }
        })
    }

    /// Label used in export file names.
    pub fn export_label(&self) -> String {
        match self.integration {
            Integration::Hubspot => format!("{}_{}", self.integration.display_name(), self.hubspot_object.label()),
            other => other.display_name().to_string(),
        }
    }

    fn load_options(&self, force: bool) -> LoadOptions {
        let options = LoadOptions::default().with_hubspot_object(self.hubspot_object);
        if force {
            options.forced()
        } else {
            options
        }
    }
}

// =============================================================================
// Dashboard
// =============================================================================

/// The dashboard: one per user session.
pub struct Dashboard {
    config: Config,
    session: Session,
    client: Arc<ApiClient>,
    store: StatusStore,
    notifier: Notifier,
    bus: MessageBus,
    refresh: Arc<Notify>,
    views: Mutex<BTreeMap<Integration, DataView>>,
}

impl Dashboard {
    pub fn new(config: Config) -> Self {
        let client = ApiClient::new(config.api_url.clone());
        Self::with_client(config, client)
    }

    pub fn with_client(config: Config, client: ApiClient) -> Self {
        let views = Integration::ALL.iter().map(|&i| (i, DataView::new(i))).collect();
        Self {
            session: config.session(),
            config,
            client: Arc::new(client),
            store: StatusStore::new(),
            notifier: Notifier::new(),
            bus: MessageBus::new(),
            refresh: Arc::new(Notify::new()),
            views: Mutex::new(views),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    fn poller(&self) -> Poller<ApiClient> {
        Poller::new(self.client.clone(), self.store.clone(), self.session.clone())
            .with_interval(self.config.poll_interval)
            .with_refresh_trigger(self.refresh.clone())
    }

    /// Run one status cycle now, without a background poller.
    pub async fn refresh_status(&self) -> PollReport {
        self.poller().poll_once().await
    }

    /// Ask the running poller for an immediate cycle.
    pub fn request_refresh(&self) {
        self.refresh.notify_one();
    }

    /// Start background polling. Every bus message also triggers a refresh.
    /// Dropping the returned handle stops both.
    pub fn start_polling(&self) -> LiveStatus {
        let poller = self.poller().spawn();
        let mut messages = self.bus.subscribe();
        let refresh = self.refresh.clone();
        let listener = tokio::spawn(async move {
            loop {
                match messages.recv().await {
                    Ok(message) => {
                        tracing::debug!(%message, "refreshing status");
                        refresh.notify_one();
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => refresh.notify_one(),
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        LiveStatus {
            poller: Some(poller),
            listener,
        }
    }

    /// Run the OAuth connect flow for `integration`.
    pub async fn connect(&self, integration: Integration, launcher: &dyn PopupLauncher) -> ConnectResult<()> {
        let ctx = ConnectContext::new(&self.client, &self.session, &self.notifier, &self.bus, &self.refresh)
            .with_check_interval(self.config.popup_check_interval);
        oauth::connect(&ctx, integration, launcher).await?;
        self.request_refresh();
        Ok(())
    }

    /// Disconnect `integration` and drop its loaded data.
    pub async fn disconnect(&self, integration: Integration) -> DashboardResult<()> {
        let name = integration.display_name();
        match self.client.disconnect(integration, &self.session).await {
            Ok(()) => {
                self.notifier.success(format!("Successfully disconnected from {}", name));
                self.clear(integration);
                self.bus.publish(WindowMessage::StatusChanged);
                Ok(())
            }
            Err(e) => {
                self.notifier.error(format!("Failed to disconnect from {}", name));
                Err(e.into())
            }
        }
    }

    // -------------------------------------------------------------------------
    // Data views
    // -------------------------------------------------------------------------

    fn views(&self) -> MutexGuard<'_, BTreeMap<Integration, DataView>> {
        // Poisoning is ignored: the map only holds plain data.
        self.views.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of an integration's data view.
    pub fn view(&self, integration: Integration) -> DataView {
        self.views()
            .get(&integration)
            .cloned()
            .unwrap_or_else(|| DataView::new(integration))
    }

    pub fn select_hubspot_object(&self, object: HubspotObject) {
        self.views()
            .entry(Integration::Hubspot)
            .or_insert_with(|| DataView::new(Integration::Hubspot))
            .hubspot_object = object;
    }

    /// Load records for a connected integration. `force` bypasses the
    /// backend cache. Returns the number of records loaded.
    pub async fn load(&self, integration: Integration, force: bool) -> DashboardResult<usize> {
        let Some(credentials) = self.store.credentials(integration) else {
            self.notifier.warning(format!("{} is not connected", integration.display_name()));
            return Err(DashboardError::NotConnected(integration.display_name().to_string()));
        };
        let options = self.view(integration).load_options(force);

        match self.client.load(integration, &credentials, options).await {
            Ok(records) => {
                let count = records.len();
                self.views()
                    .entry(integration)
                    .or_insert_with(|| DataView::new(integration))
                    .records = Some(records);
                Ok(count)
            }
            Err(e) => {
                self.notifier
                    .error(e.detail().unwrap_or("An error occurred").to_string());
                Err(e.into())
            }
        }
    }

    pub fn clear(&self, integration: Integration) {
        if let Some(view) = self.views().get_mut(&integration) {
            view.clear();
        }
    }

    pub fn table(&self, integration: Integration) -> TableView {
        self.view(integration).table()
    }

    /// Export an integration's loaded records into `dir`.
    pub fn export(&self, integration: Integration, dir: &Path) -> DashboardResult<PathBuf> {
        let view = self.view(integration);
        match export_to_dir(view.records(), &view.export_label(), dir) {
            Ok(path) => {
                self.notifier.success(format!("Exported to {}", path.display()));
                Ok(path)
            }
            Err(e) => {
                self.notifier.error(e.to_string());
                Err(e.into())
            }
        }
    }
}

/// Background status polling started by [`Dashboard::start_polling`].
#[derive(Debug)]
pub struct LiveStatus {
    poller: Option<PollerHandle>,
    listener: JoinHandle<()>,
}

impl LiveStatus {
    pub fn refresh_now(&self) {
        if let Some(poller) = &self.poller {
            poller.refresh_now();
        }
    }

    pub async fn stop(mut self) {
        self.listener.abort();
        if let Some(poller) = self.poller.take() {
            poller.stop().await;
        }
    }
}

impl Drop for LiveStatus {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summary_lines() {
        let mut view = DataView::new(Integration::Notion);
        assert_eq!(view.summary(), None);

        view.records = Some(vec![]);
        assert_eq!(view.summary().unwrap(), "Did not find any data for this search request");

        view.records = Some(vec![json!({"id": 1}), json!({"id": 2})]);
        assert_eq!(view.summary().unwrap(), "Loaded Items: 2 items loaded");

        view.clear();
        assert_eq!(view.summary(), None);
        assert!(view.table().is_empty());
    }

    #[test]
    fn test_export_label() {
        let mut view = DataView::new(Integration::Hubspot);
        view.hubspot_object = HubspotObject::Deals;
        assert_eq!(view.export_label(), "HubSpot_Deals");
        assert_eq!(DataView::new(Integration::Airtable).export_label(), "Airtable");
    }

    #[test]
    fn test_load_options_follow_selection() {
        let mut view = DataView::new(Integration::Hubspot);
        view.hubspot_object = HubspotObject::Tickets;
        let options = view.load_options(true);
        assert!(options.force);
        assert_eq!(options.hubspot_object, HubspotObject::Tickets);
    }

    #[tokio::test]
    async fn test_load_requires_connection() {
        let dashboard = Dashboard::new(Config::default());
        let mut notes = dashboard.notifier().subscribe();
        let err = dashboard.load(Integration::Notion, false).await.unwrap_err();
        assert!(matches!(err, DashboardError::NotConnected(_)));
        assert_eq!(notes.recv().await.unwrap().message, "Notion is not connected");
    }

    #[test]
    fn test_select_hubspot_object() {
        let dashboard = Dashboard::new(Config::default());
        dashboard.select_hubspot_object(HubspotObject::Companies);
        assert_eq!(dashboard.view(Integration::Hubspot).hubspot_object, HubspotObject::Companies);
    }
}
