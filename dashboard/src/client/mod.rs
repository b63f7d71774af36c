//! HTTP client for the integrations backend.
//!
//! # Endpoints
//!
//! | Method | Path                                   | Returns                 |
//! |--------|----------------------------------------|-------------------------|
//! | GET    | `connection-info/{integration}`        | [`ConnectionInfo`]      |
//! | POST   | `{integration}/authorize` (form)       | authorization URL       |
//! | POST   | `{integration}/credentials` (form)     | credentials object      |
//! | POST   | `disconnect/{integration}`             | success / failure       |
//! | POST   | `{integration}/load?force&api_type`    | records                 |
//!
//! Scoped calls carry `user_id` and `org_id`, as form fields or query
//! parameters depending on the endpoint.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ClientError, ClientResult};
use crate::models::{load_body, normalize_records, ConnectionInfo, HubspotObject, Integration, Session};
use crate::status::StatusSource;

/// Error body the backend sends with non-success statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Value,
}

/// Options of a data load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Bypass the backend cache.
    pub force: bool,
    /// HubSpot object type; ignored for other integrations.
    pub hubspot_object: HubspotObject,
}

impl LoadOptions {
    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }

    pub fn with_hubspot_object(mut self, object: HubspotObject) -> Self {
        self.hubspot_object = object;
        self
    }

    fn query(&self, integration: Integration) -> Vec<(&'static str, &'static str)> {
        let mut query = Vec::new();
        if self.force {
            query.push(("force", "true"));
        }
        if integration == Integration::Hubspot {
            query.push(("api_type", self.hubspot_object.as_str()));
        }
        query
    }
}

/// Integrations backend client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the backend at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a client reusing an existing `reqwest::Client`.
    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// `GET connection-info/{integration}`
    pub async fn connection_info(&self, integration: Integration, session: &Session) -> ClientResult<ConnectionInfo> {
        let response = self
            .http
            .get(self.url(&format!("connection-info/{}", integration.slug())))
            .query(&session.params())
            .send()
            .await?;
        let info: ConnectionInfo = check(response).await?.json().await?;
        tracing::debug!(integration = integration.slug(), connected = info.connected, "connection info");
        Ok(info)
    }

    /// `POST {integration}/authorize`, returning the authorization URL.
    pub async fn authorize(&self, integration: Integration, session: &Session) -> ClientResult<String> {
        let response = self
            .http
            .post(self.url(&format!("{}/authorize", integration.slug())))
            .form(&session.params())
            .send()
            .await?;
        let body = check(response).await?.text().await?;
        let url = match serde_json::from_str::<Value>(&body) {
            Ok(Value::String(url)) => url,
            Ok(other) => {
                return Err(ClientError::InvalidResponse(format!(
                    "expected an authorization URL, got {}",
                    other
                )))
            }
            Err(_) => body.trim().to_string(),
        };
        if url.is_empty() {
            return Err(ClientError::InvalidResponse("empty authorization URL".to_string()));
        }
        Ok(url)
    }

    /// `POST {integration}/credentials`
    pub async fn credentials(&self, integration: Integration, session: &Session) -> ClientResult<Value> {
        let response = self
            .http
            .post(self.url(&format!("{}/credentials", integration.slug())))
            .form(&session.params())
            .send()
            .await?;
        let credentials: Value = check(response).await?.json().await?;
        if credentials.is_null() {
            return Err(ClientError::InvalidResponse("no credentials returned".to_string()));
        }
        Ok(credentials)
    }

    /// `POST disconnect/{integration}`
    pub async fn disconnect(&self, integration: Integration, session: &Session) -> ClientResult<()> {
        let response = self
            .http
            .post(self.url(&format!("disconnect/{}", integration.slug())))
            .query(&session.params())
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    /// `POST {integration}/load`, normalized to a record list.
    pub async fn load(&self, integration: Integration, credentials: &Value, options: LoadOptions) -> ClientResult<Vec<Value>> {
        let response = self
            .http
            .post(self.url(&format!("{}/load", integration.slug())))
            .query(&options.query(integration))
            .json(&load_body(credentials))
            .send()
            .await?;
        let body: Value = check(response).await?.json().await?;
        let records = normalize_records(body)
            .ok_or_else(|| ClientError::InvalidResponse("expected an array of records or {items: [...]}".to_string()))?;
        tracing::info!(integration = integration.slug(), force = options.force, count = records.len(), "loaded records");
        Ok(records)
    }
}

/// Turn a non-success response into [`ClientError::Status`].
async fn check(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .map(|e| match e.detail {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()));
    Err(ClientError::Status {
        status: status.as_u16(),
        detail,
    })
}

#[async_trait]
impl StatusSource for ApiClient {
    async fn fetch_status(&self, integration: Integration, session: &Session) -> ClientResult<ConnectionInfo> {
        self.connection_info(integration, session).await
    }
}
