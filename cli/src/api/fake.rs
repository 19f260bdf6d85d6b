//! In-memory dashboard for tests.
//!
//! Records every call in order and can simulate unreachable organizations,
//! slow responses, rejected creates and raw listing bodies.

use super::client::{ApiResponse, DashboardApi};
use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// Every call the fake received, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    ListOrganizations,
    ListAdmins(String),
    Create(String, Value),
    Update(String, String, Value),
    Delete(String, String),
}

impl Request {
    pub fn is_mutating(&self) -> bool {
        matches!(self, Request::Create(..) | Request::Update(..) | Request::Delete(..))
    }
}

/// In-memory dashboard. Admins created through it show up in later listings.
pub struct FakeDashboard {
    orgs: Vec<Value>,
    admins: Mutex<HashMap<String, Vec<Value>>>,
    requests: Mutex<Vec<Request>>,
    raw_listing: Option<String>,
    unreachable: bool,
    unreachable_orgs: HashSet<String>,
    create_status: u16,
    delay: Option<Duration>,
    next_id: Mutex<u64>,
}

impl Default for FakeDashboard {
    fn default() -> Self {
        Self {
            orgs: Vec::new(),
            admins: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            raw_listing: None,
            unreachable: false,
            unreachable_orgs: HashSet::new(),
            create_status: 201,
            delay: None,
            next_id: Mutex::new(1000),
        }
    }
}

impl FakeDashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_org(mut self, id: &str, name: &str) -> Self {
        self.orgs.push(json!({"id": id, "name": name}));
        self
    }

    pub fn with_admin(self, org_id: &str, id: &str, email: &str) -> Self {
        self.admins
            .lock()
            .unwrap()
            .entry(org_id.to_string())
            .or_default()
            .push(json!({"id": id, "email": email, "name": email}));
        self
    }

    /// Serve this body verbatim for every admin listing.
    pub fn with_raw_listing(mut self, body: &str) -> Self {
        self.raw_listing = Some(body.to_string());
        self
    }

    pub fn with_create_status(mut self, status: u16) -> Self {
        self.create_status = status;
        self
    }

    /// Every call fails at the transport level.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// Calls for this organization fail at the transport level.
    pub fn unreachable_org(mut self, org_id: &str) -> Self {
        self.unreachable_orgs.insert(org_id.to_string());
        self
    }

    /// Sleep before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn mutating_requests(&self) -> Vec<Request> {
        self.requests().into_iter().filter(Request::is_mutating).collect()
    }

    async fn record(&self, request: Request, org_id: Option<&str>) -> ApiResult<()> {
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let org_down = org_id.is_some_and(|org| self.unreachable_orgs.contains(org));
        if self.unreachable || org_down {
            return Err(ApiError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DashboardApi for FakeDashboard {
    async fn list_organizations(&self) -> ApiResult<ApiResponse> {
        self.record(Request::ListOrganizations, None).await?;
        Ok(ApiResponse::new(200, Value::Array(self.orgs.clone()).to_string()))
    }

    async fn list_admins(&self, org_id: &str) -> ApiResult<ApiResponse> {
        self.record(Request::ListAdmins(org_id.to_string()), Some(org_id)).await?;
        if let Some(body) = &self.raw_listing {
            return Ok(ApiResponse::new(200, body.clone()));
        }
        let admins = self.admins.lock().unwrap().get(org_id).cloned().unwrap_or_default();
        Ok(ApiResponse::new(200, Value::Array(admins).to_string()))
    }

    async fn create_admin(&self, org_id: &str, payload: &Value) -> ApiResult<ApiResponse> {
        self.record(Request::Create(org_id.to_string(), payload.clone()), Some(org_id))
            .await?;
        if self.create_status >= 300 {
            return Ok(ApiResponse::new(self.create_status, r#"{"errors":["rejected"]}"#));
        }

        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            next.to_string()
        };
        let mut admin = payload.clone();
        admin["id"] = json!(id);
        self.admins
            .lock()
            .unwrap()
            .entry(org_id.to_string())
            .or_default()
            .push(admin.clone());
        Ok(ApiResponse::new(self.create_status, admin.to_string()))
    }

    async fn update_admin(&self, org_id: &str, admin_id: &str, payload: &Value) -> ApiResult<ApiResponse> {
        self.record(
            Request::Update(org_id.to_string(), admin_id.to_string(), payload.clone()),
            Some(org_id),
        )
        .await?;
        Ok(ApiResponse::new(200, payload.to_string()))
    }

    async fn delete_admin(&self, org_id: &str, admin_id: &str) -> ApiResult<ApiResponse> {
        self.record(Request::Delete(org_id.to_string(), admin_id.to_string()), Some(org_id))
            .await?;
        if let Some(admins) = self.admins.lock().unwrap().get_mut(org_id) {
            admins.retain(|a| a.get("id").and_then(Value::as_str) != Some(admin_id));
        }
        Ok(ApiResponse::new(204, ""))
    }
}
