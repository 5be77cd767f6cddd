/// Identity Provider Client
///
/// Email/password accounts at the identity provider, plus the provider's
/// auth-state change stream. `FirebaseIdentityClient` talks to the Identity
/// Toolkit REST API.
use crate::auth::error::{AuthError, ProviderErrorCode};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};
use url::Url;

/// The provider's view of a signed-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUser {
    pub uid: String,
    pub email: Option<String>,
    /// Fresh ID token, usable as the session credential
    pub id_token: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Check an email/password pair
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderUser, AuthError>;

    /// Create a new email/password account (signed in on success)
    async fn create_user(&self, email: &str, password: &str) -> Result<ProviderUser, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Auth-state changes; the current value is the signed-in user, if any
    fn subscribe(&self) -> watch::Receiver<Option<ProviderUser>>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    email: Option<String>,
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Identity Toolkit REST client
pub struct FirebaseIdentityClient {
    toolkit_url: String,
    api_key: String,
    http_client: reqwest::Client,
    current: watch::Sender<Option<ProviderUser>>,
}

impl FirebaseIdentityClient {
    pub fn new(toolkit_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, AuthError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AuthError::HttpError(format!("Failed to create HTTP client: {}", e)))?;

        let (current, _) = watch::channel(None);

        Ok(Self {
            toolkit_url: toolkit_url.into(),
            api_key: api_key.into(),
            http_client,
            current,
        })
    }

    fn endpoint(&self, method: &str) -> Result<Url, AuthError> {
        let mut url = Url::parse(&format!(
            "{}/v1/accounts:{}",
            self.toolkit_url.trim_end_matches('/'),
            method
        ))
        .map_err(|e| AuthError::InvalidConfig {
            key: "identity.toolkit_url".to_string(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    async fn password_call(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<ProviderUser, AuthError> {
        let response = self
            .http_client
            .post(self.endpoint(method)?)
            .json(&PasswordRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let code = parse_error_code(&body);
            debug!(%status, %code, "identity provider rejected {}", method);
            return Err(AuthError::Provider(code));
        }

        let account: AccountResponse = serde_json::from_str(&body)?;
        let user = ProviderUser {
            uid: account.local_id,
            email: account.email,
            id_token: account.id_token,
        };

        self.current.send_replace(Some(user.clone()));
        Ok(user)
    }
}

/// Error code from an Identity Toolkit error body
fn parse_error_code(body: &str) -> ProviderErrorCode {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| ProviderErrorCode::from_provider_message(&envelope.error.message))
        .unwrap_or(ProviderErrorCode::Unknown)
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderUser, AuthError> {
        self.password_call("signInWithPassword", email, password).await
    }

    async fn create_user(&self, email: &str, password: &str) -> Result<ProviderUser, AuthError> {
        let user = self.password_call("signUp", email, password).await?;
        info!(uid = %user.uid, "created provider account");
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.current.send_replace(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<ProviderUser>> {
        self.current.subscribe()
    }
}
