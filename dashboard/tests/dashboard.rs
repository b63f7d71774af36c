//! Connect, disconnect and load flows against a mock integrations backend.

use dataport::oauth::{FlagPopup, Popup, PopupLauncher, WindowMessage};
use dataport::{Config, Dashboard, DashboardError, Integration, Notification, Severity};
use serde_json::json;
use std::time::Duration;
use tokio::sync::broadcast;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Opens a window the user has already closed.
struct ClosedLauncher;

impl PopupLauncher for ClosedLauncher {
    fn open(&self, _url: &str) -> Option<Box<dyn Popup>> {
        let popup = FlagPopup::new();
        popup.close();
        Some(Box::new(popup))
    }
}

fn dashboard(server: &MockServer) -> Dashboard {
    let config = Config {
        api_url: server.uri(),
        popup_check_interval: Duration::from_millis(10),
        ..Config::default()
    };
    Dashboard::new(config)
}

fn drain(rx: &mut broadcast::Receiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(notification) = rx.try_recv() {
        out.push(notification);
    }
    out
}

async fn mount_connected(server: &MockServer, integration: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/connection-info/{}", integration)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "connected": true,
            "connected_at": "2024-01-15T10:00:00Z",
            "credentials": {"access_token": "tok"}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_connect_flow() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notion/authorize"))
        .respond_with(ResponseTemplate::new(200).set_body_json("https://auth.example.com/notion"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/notion/credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok"})))
        .expect(1)
        .mount(&server)
        .await;

    let dashboard = dashboard(&server);
    let mut notes = dashboard.notifier().subscribe();
    let mut messages = dashboard.bus().subscribe();

    dashboard.connect(Integration::Notion, &ClosedLauncher).await.unwrap();

    let notes = drain(&mut notes);
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].severity, Severity::Info);
    assert_eq!(notes[0].message, "Redirecting to Notion authorization...");
    assert_eq!(notes[1].severity, Severity::Success);
    assert_eq!(notes[1].message, "Successfully connected to Notion!");
    assert_eq!(messages.try_recv().unwrap(), WindowMessage::Connected(Integration::Notion));
}

#[tokio::test]
async fn test_connect_authorize_failure_uses_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hubspot/authorize"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "Missing client id"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/airtable/authorize"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let dashboard = dashboard(&server);
    let mut notes = dashboard.notifier().subscribe();

    assert!(dashboard.connect(Integration::Hubspot, &ClosedLauncher).await.is_err());
    assert!(dashboard.connect(Integration::Airtable, &ClosedLauncher).await.is_err());

    let notes = drain(&mut notes);
    let messages: Vec<&str> = notes.iter().map(|n| n.message.as_str()).collect();
    assert_eq!(messages, vec!["Missing client id", "Failed to connect to Airtable"]);
    assert!(notes.iter().all(|n| n.severity == Severity::Error));
}

#[tokio::test]
async fn test_connect_credentials_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notion/authorize"))
        .respond_with(ResponseTemplate::new(200).set_body_json("https://auth.example.com"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/notion/credentials"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "No credentials found."})))
        .mount(&server)
        .await;

    let dashboard = dashboard(&server);
    let mut notes = dashboard.notifier().subscribe();
    let mut messages = dashboard.bus().subscribe();

    assert!(dashboard.connect(Integration::Notion, &ClosedLauncher).await.is_err());
    let notes = drain(&mut notes);
    assert_eq!(notes.last().unwrap().message, "Failed to get Notion credentials");
    assert!(messages.try_recv().is_err());
}

#[tokio::test]
async fn test_disconnect() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/disconnect/notion"))
        .and(query_param("user_id", "TestUser"))
        .and(query_param("org_id", "TestOrg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/disconnect/hubspot"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_connected(&server, "notion").await;
    Mock::given(method("POST"))
        .and(path("/notion/load"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "a"}])))
        .mount(&server)
        .await;

    let dashboard = dashboard(&server);
    dashboard.refresh_status().await;
    dashboard.load(Integration::Notion, false).await.unwrap();
    assert!(dashboard.view(Integration::Notion).records.is_some());

    let mut notes = dashboard.notifier().subscribe();
    let mut messages = dashboard.bus().subscribe();

    dashboard.disconnect(Integration::Notion).await.unwrap();
    assert!(dashboard.view(Integration::Notion).records.is_none());
    assert_eq!(messages.try_recv().unwrap(), WindowMessage::StatusChanged);

    assert!(dashboard.disconnect(Integration::Hubspot).await.is_err());

    let notes = drain(&mut notes);
    assert_eq!(notes[0].message, "Successfully disconnected from Notion");
    assert_eq!(notes[1].message, "Failed to disconnect from HubSpot");
    assert_eq!(notes[1].severity, Severity::Error);
}

#[tokio::test]
async fn test_load_and_export() {
    let server = MockServer::start().await;
    mount_connected(&server, "hubspot").await;
    Mock::given(method("POST"))
        .and(path("/hubspot/load"))
        .and(query_param("api_type", "companies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [
            {"id": "3fa85f64-5717-4562-b3fc-2c963f66afa6", "name": "Acme", "created": "2024-01-15T10:00:00Z"},
            {"id": "9b2d1e7a-1111-4000-8000-000000000000", "name": "Beta", "created": null}
        ]})))
        .mount(&server)
        .await;

    let dashboard = dashboard(&server);
    let report = dashboard.refresh_status().await;
    assert!(report.fetched.contains(&Integration::Hubspot));
    assert!(dashboard.store().is_connected(Integration::Hubspot));

    dashboard.select_hubspot_object(dataport::HubspotObject::Companies);
    assert_eq!(dashboard.load(Integration::Hubspot, false).await.unwrap(), 2);

    let view = dashboard.view(Integration::Hubspot);
    assert_eq!(view.summary().unwrap(), "Loaded Items: 2 items loaded");

    let table = dashboard.table(Integration::Hubspot);
    let titles: Vec<&str> = table.columns.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["Id", "Name", "Created"]);
    assert_eq!(table.rows[0].cells[0].text(), "3fa85f64...");
    assert_eq!(table.rows[0].cells[2].text(), "15 Jan 2024 10:00:00 AM");
    assert_eq!(table.rows[1].cells[2].text(), "-");

    let dir = tempfile::tempdir().unwrap();
    let path = dashboard.export(Integration::Hubspot, dir.path()).unwrap();
    let name = path.file_name().unwrap().to_str().unwrap().to_string();
    assert!(name.starts_with("HubSpot_Companies_data_"));
    let csv = std::fs::read_to_string(path).unwrap();
    assert!(csv.starts_with("id,name,created\n3fa85f64-5717-4562-b3fc-2c963f66afa6,Acme,15 Jan 2024 10:00:00 AM\n"));
}

#[tokio::test]
async fn test_load_failures_notify() {
    let server = MockServer::start().await;
    mount_connected(&server, "notion").await;
    mount_connected(&server, "airtable").await;
    Mock::given(method("POST"))
        .and(path("/notion/load"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/airtable/load"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dashboard = dashboard(&server);
    dashboard.refresh_status().await;
    let mut notes = dashboard.notifier().subscribe();

    let err = dashboard.load(Integration::Notion, true).await.unwrap_err();
    assert!(matches!(err, DashboardError::Client(_)));
    assert!(dashboard.load(Integration::Airtable, false).await.is_err());

    let notes = drain(&mut notes);
    assert_eq!(notes[0].message, "Token expired");
    assert_eq!(notes[1].message, "An error occurred");
    assert!(dashboard.view(Integration::Notion).summary().is_none());
}

#[tokio::test]
async fn test_empty_load_summary() {
    let server = MockServer::start().await;
    mount_connected(&server, "airtable").await;
    Mock::given(method("POST"))
        .and(path("/airtable/load"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let dashboard = dashboard(&server);
    dashboard.refresh_status().await;
    assert_eq!(dashboard.load(Integration::Airtable, false).await.unwrap(), 0);
    assert_eq!(
        dashboard.view(Integration::Airtable).summary().unwrap(),
        "Did not find any data for this search request"
    );

    let dir = tempfile::tempdir().unwrap();
    assert!(dashboard.export(Integration::Airtable, dir.path()).is_err());
}

#[tokio::test]
async fn test_live_status_refreshes_on_bus_message() {
    let server = MockServer::start().await;
    mount_connected(&server, "notion").await;
    mount_connected(&server, "hubspot").await;
    mount_connected(&server, "airtable").await;

    let mut config = Config {
        api_url: server.uri(),
        ..Config::default()
    };
    config.poll_interval = Duration::from_secs(3600);
    let dashboard = Dashboard::new(config);

    let mut changes = dashboard.store().subscribe();
    let live = dashboard.start_polling();
    tokio::time::timeout(Duration::from_secs(5), changes.changed())
        .await
        .unwrap()
        .unwrap();

    let before = server.received_requests().await.unwrap().len();
    dashboard.bus().publish(WindowMessage::StatusChanged);
    tokio::time::sleep(Duration::from_millis(300)).await;
    let after = server.received_requests().await.unwrap().len();
    assert!(after >= before + 3, "expected a refresh cycle, got {} -> {}", before, after);

    live.stop().await;
}
