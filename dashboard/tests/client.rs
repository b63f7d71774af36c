//! Backend client against a mock integrations backend.

use dataport::{ApiClient, ClientError, HubspotObject, Integration, LoadOptions, Session};
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session() -> Session {
    Session::new("TestUser", "TestOrg")
}

#[tokio::test]
async fn test_connection_info_scoped_to_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/connection-info/notion"))
        .and(query_param("user_id", "TestUser"))
        .and(query_param("org_id", "TestOrg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "connected": true,
            "connected_at": "2024-01-15T10:00:00",
            "credentials": {"access_token": "tok", "workspace": "w"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let info = client.connection_info(Integration::Notion, &session()).await.unwrap();
    assert!(info.connected);
    assert_eq!(info.connected_at.as_deref(), Some("2024-01-15T10:00:00"));
    assert_eq!(info.credentials.unwrap()["access_token"], "tok");
}

#[tokio::test]
async fn test_authorize_accepts_json_string_or_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notion/authorize"))
        .and(body_string_contains("user_id=TestUser"))
        .and(body_string_contains("org_id=TestOrg"))
        .respond_with(ResponseTemplate::new(200).set_body_json("https://api.notion.com/v1/oauth/authorize?x=1"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/airtable/authorize"))
        .respond_with(ResponseTemplate::new(200).set_body_string("https://airtable.com/oauth2/v1/authorize\n"))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    assert_eq!(
        client.authorize(Integration::Notion, &session()).await.unwrap(),
        "https://api.notion.com/v1/oauth/authorize?x=1"
    );
    assert_eq!(
        client.authorize(Integration::Airtable, &session()).await.unwrap(),
        "https://airtable.com/oauth2/v1/authorize"
    );
}

#[tokio::test]
async fn test_load_forwards_access_token_only() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hubspot/load"))
        .and(query_param("force", "true"))
        .and(query_param("api_type", "deals"))
        .and(body_json(json!({"credentials": {"access_token": "tok"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": "1", "name": "Deal"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let credentials = json!({"access_token": "tok", "refresh_token": "never-sent"});
    let options = LoadOptions::default().forced().with_hubspot_object(HubspotObject::Deals);
    let records = client.load(Integration::Hubspot, &credentials, options).await.unwrap();
    assert_eq!(records, vec![json!({"id": "1", "name": "Deal"})]);
}

#[tokio::test]
async fn test_load_bare_array() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notion/load"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "a"}, {"id": "b"}])))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let records = client
        .load(Integration::Notion, &json!({"access_token": "t"}), LoadOptions::default())
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_unexpected_load_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notion/load"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let err = client
        .load(Integration::Notion, &json!({}), LoadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_error_detail_surfaces() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hubspot/load"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "detail": "API type is required for HubSpot integration"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/disconnect/airtable"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let err = client
        .load(Integration::Hubspot, &json!({}), LoadOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.detail(), Some("API type is required for HubSpot integration"));

    let err = client.disconnect(Integration::Airtable, &session()).await.unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 500, detail: None }));
}

#[tokio::test]
async fn test_unreachable_backend() {
    let client = ApiClient::new("http://127.0.0.1:9");
    let err = client.connection_info(Integration::Notion, &session()).await.unwrap_err();
    assert!(matches!(err, ClientError::Http(_)));
}
