//! Backend REST API client
//!
//! User profiles, tasks, categories and dashboard data live in a separate
//! backend service. Most responses wrap their payload in `{ "data": ... }`.

use crate::auth::error::AuthError;
use crate::auth::identity::{Identity, ProfileRegistration};
use crate::auth::state::ProfileStore;
use crate::config::Config;
use crate::tasks::model::{Category, DashboardStats, Task, TaskPayload, WeatherReport};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to create HTTP client: {0}")]
    ClientInitialization(String),

    #[error("Backend request failed: {0}")]
    RequestFailed(String),

    #[error("Backend request timed out")]
    Timeout,

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected backend response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::Status { status: 404, .. })
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Timeout
        } else {
            BackendError::RequestFailed(err.to_string())
        }
    }
}

impl From<BackendError> for AuthError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Timeout => AuthError::Timeout,
            other => AuthError::Backend(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// List payloads may be `null` or missing entirely
#[derive(Debug, Deserialize)]
struct ListEnvelope<T> {
    data: Option<Vec<T>>,
}

pub struct BackendClient {
    base_url: Url,
    http_client: reqwest::Client,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        // Trailing slash so `join` appends rather than replaces the last segment
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|e| BackendError::InvalidUrl(e.to_string()))?;

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::ClientInitialization(e.to_string()))?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, BackendError> {
        Self::new(&config.backend.base_url, config.backend_timeout())
    }

    fn url(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| BackendError::InvalidUrl(e.to_string()))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&TaskPayload>,
    ) -> Result<reqwest::Response, BackendError> {
        let url = self.url(path)?;
        debug!("{} {}", method, url);

        let mut request = self.http_client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        self.send(Method::GET, path, None)
            .await?
            .json::<T>()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }

    /// Profile for a provider uid (`GET /auth/user/{uid}`)
    pub async fn fetch_user(&self, uid: &str) -> Result<Identity, BackendError> {
        let envelope: Envelope<Identity> = self
            .get_json(&format!("auth/user/{}", urlencoding::encode(uid)))
            .await?;
        Ok(envelope.data)
    }

    /// Create the backend profile for a new provider account
    pub async fn register_user(&self, registration: &ProfileRegistration) -> Result<(), BackendError> {
        let url = self.url("auth/register")?;
        let response = self.http_client.post(url).json(registration).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    pub async fn list_tasks(&self, user_id: i64) -> Result<Vec<Task>, BackendError> {
        let envelope: ListEnvelope<Task> =
            self.get_json(&format!("users/{}/tasks", user_id)).await?;
        Ok(envelope.data.unwrap_or_default())
    }

    pub async fn create_task(&self, payload: &TaskPayload) -> Result<(), BackendError> {
        self.send(Method::POST, "tasks", Some(payload)).await?;
        Ok(())
    }

    pub async fn update_task(&self, task_id: i64, payload: &TaskPayload) -> Result<(), BackendError> {
        self.send(Method::PUT, &format!("tasks/{}", task_id), Some(payload))
            .await?;
        Ok(())
    }

    pub async fn delete_task(&self, task_id: i64) -> Result<(), BackendError> {
        self.send(Method::DELETE, &format!("tasks/{}", task_id), None)
            .await?;
        Ok(())
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
        let envelope: ListEnvelope<Category> = self.get_json("categories").await?;
        Ok(envelope.data.unwrap_or_default())
    }

    pub async fn dashboard_stats(&self, uid: &str) -> Result<DashboardStats, BackendError> {
        let envelope: Envelope<DashboardStats> = self
            .get_json(&format!("dashboard/stats/{}", urlencoding::encode(uid)))
            .await?;
        Ok(envelope.data)
    }

    /// Weather is returned unwrapped (`{ data, last_sync }` is the report itself)
    pub async fn weather(&self) -> Result<WeatherReport, BackendError> {
        self.get_json("dashboard/weather").await
    }
}

#[async_trait]
impl ProfileStore for BackendClient {
    async fn fetch_profile(&self, uid: &str) -> Result<Identity, AuthError> {
        match self.fetch_user(uid).await {
            Ok(identity) => Ok(identity),
            Err(e) if e.is_not_found() => Err(AuthError::ProfileNotFound(uid.to_string())),
            Err(e) => {
                warn!(uid, "profile lookup failed: {}", e);
                Err(e.into())
            }
        }
    }

    async fn register_profile(&self, registration: ProfileRegistration) -> Result<(), AuthError> {
        self.register_user(&registration).await.map_err(Into::into)
    }
}

/// Status worth surfacing to callers that proxy backend failures
pub fn gateway_status(err: &BackendError) -> StatusCode {
    match err {
        BackendError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        BackendError::Status { status: 404, .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_GATEWAY,
    }
}
