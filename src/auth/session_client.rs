// Session endpoint client
// Calls the app's own /api/auth/session on behalf of the auth state provider

use crate::auth::error::AuthError;
use crate::auth::state::SessionEndpoint;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::warn;
use url::Url;

pub const SESSION_PATH: &str = "/api/auth/session";

pub struct HttpSessionClient {
    endpoint: Url,
    http_client: reqwest::Client,
}

impl HttpSessionClient {
    pub fn new(app_url: &str, timeout: Duration) -> Result<Self, AuthError> {
        let endpoint = Url::parse(app_url)
            .and_then(|base| base.join(SESSION_PATH))
            .map_err(|e| AuthError::InvalidConfig {
                key: "app_url".to_string(),
                reason: e.to_string(),
            })?;

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::HttpError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint,
            http_client,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Only transport failures are errors; an error status is logged and ignored.
/// There is no cookie store, so the `Set-Cookie` in the reply is dropped.
#[async_trait]
impl SessionEndpoint for HttpSessionClient {
    async fn set_session(&self, credential: &str) -> Result<(), AuthError> {
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(&json!({ "token": credential }))
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "session endpoint refused the credential");
        }
        Ok(())
    }

    async fn clear_session(&self) -> Result<(), AuthError> {
        let response = self.http_client.delete(self.endpoint.clone()).send().await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "session endpoint failed to clear the cookie");
        }
        Ok(())
    }
}
