//! Dashboard HTTP client.
//!
//! [`DashboardApi`] is the seam between the dispatcher and the network.
//! [`HttpDashboard`] is the reqwest implementation used by the binary.
//!
//! | Operation        | Method | Path                                       |
//! |------------------|--------|--------------------------------------------|
//! | list orgs        | GET    | `{base}/organizations`                     |
//! | list admins      | GET    | `{base}/organizations/{org}/admins`        |
//! | create admin     | POST   | `{base}/organizations/{org}/admins`        |
//! | update admin     | PUT    | `{base}/organizations/{org}/admins/{id}`   |
//! | delete admin     | DELETE | `{base}/organizations/{org}/admins/{id}`   |

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ApiResult, ConfigError};

/// Header carrying the caller's API key on every request.
pub const API_KEY_HEADER: &str = "X-Cisco-Meraki-API-Key";

/// Status and body of a dashboard response, uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body parsed as JSON, or `None` when empty or not JSON.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Dashboard operations used by the dispatcher.
///
/// Implementations return `Err` only for transport-level failures; any HTTP
/// status, including errors, comes back as an [`ApiResponse`].
#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn list_organizations(&self) -> ApiResult<ApiResponse>;

    async fn list_admins(&self, org_id: &str) -> ApiResult<ApiResponse>;

    async fn create_admin(&self, org_id: &str, payload: &Value) -> ApiResult<ApiResponse>;

    async fn update_admin(&self, org_id: &str, admin_id: &str, payload: &Value) -> ApiResult<ApiResponse>;

    async fn delete_admin(&self, org_id: &str, admin_id: &str) -> ApiResult<ApiResponse>;
}

/// reqwest-backed dashboard client.
#[derive(Clone)]
pub struct HttpDashboard {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpDashboard {
    /// Create a client with a per-request timeout.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn organizations_url(&self) -> String {
        format!("{}/organizations", self.base_url)
    }

    /// Admin collection of one organization.
    pub fn admins_url(&self, org_id: &str) -> String {
        format!("{}/organizations/{}/admins", self.base_url, org_id)
    }

    pub fn admin_url(&self, org_id: &str, admin_id: &str) -> String {
        format!("{}/{}", self.admins_url(org_id), admin_id)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> ApiResult<ApiResponse> {
        let response = request.header(API_KEY_HEADER, &self.api_key).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(ApiResponse { status, body })
    }
}

#[async_trait]
impl DashboardApi for HttpDashboard {
    async fn list_organizations(&self) -> ApiResult<ApiResponse> {
        self.send(self.client.get(self.organizations_url())).await
    }

    async fn list_admins(&self, org_id: &str) -> ApiResult<ApiResponse> {
        self.send(self.client.get(self.admins_url(org_id))).await
    }

    async fn create_admin(&self, org_id: &str, payload: &Value) -> ApiResult<ApiResponse> {
        self.send(self.client.post(self.admins_url(org_id)).json(payload)).await
    }

    async fn update_admin(&self, org_id: &str, admin_id: &str, payload: &Value) -> ApiResult<ApiResponse> {
        self.send(self.client.put(self.admin_url(org_id, admin_id)).json(payload))
            .await
    }

    async fn delete_admin(&self, org_id: &str, admin_id: &str) -> ApiResult<ApiResponse> {
        self.send(self.client.delete(self.admin_url(org_id, admin_id))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let api = HttpDashboard::new("https://dashboard.example/api/v0/", "key", Duration::from_secs(5)).unwrap();
        assert_eq!(api.organizations_url(), "https://dashboard.example/api/v0/organizations");
        assert_eq!(
            api.admins_url("123"),
            "https://dashboard.example/api/v0/organizations/123/admins"
        );
        assert_eq!(
            api.admin_url("123", "77"),
            "https://dashboard.example/api/v0/organizations/123/admins/77"
        );
    }

    #[test]
    fn test_response_json() {
        assert!(ApiResponse::new(200, "").json().is_none());
        assert!(ApiResponse::new(200, "<html>").json().is_none());
        assert_eq!(ApiResponse::new(200, "[]").json(), Some(Value::Array(vec![])));
        assert!(ApiResponse::new(204, "").is_success());
        assert!(!ApiResponse::new(400, "").is_success());
    }
}
