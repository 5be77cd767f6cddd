/// Token Verification
///
/// Verifies identity-provider ID tokens. The route gate and the check endpoint
/// only consume the answer from [`verify_credential`].
use crate::auth::error::AuthError;
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

const SECURE_TOKEN_ISSUER: &str = "https://securetoken.google.com";

/// Identity decoded from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    /// Provider-issued unique id (`sub`)
    pub uid: String,
    pub email: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify a credential, returning the identity it proves
    async fn verify(&self, token: &str) -> Result<VerifiedToken, AuthError>;
}

/// Verification bounded by `timeout`.
///
/// Fail-closed: a rejection or a timeout yields `None`.
pub async fn verify_credential(
    verifier: &dyn TokenVerifier,
    token: &str,
    timeout: Duration,
) -> Option<VerifiedToken> {
    match tokio::time::timeout(timeout, verifier.verify(token)).await {
        Ok(Ok(verified)) => {
            debug!(uid = %verified.uid, "credential verified");
            Some(verified)
        }
        Ok(Err(e)) => {
            debug!("credential rejected: {}", e);
            None
        }
        Err(_) => {
            warn!(timeout_ms = timeout.as_millis() as u64, "credential verification timed out");
            None
        }
    }
}

/// Yes/no form of [`verify_credential`]
pub async fn check_credential(verifier: &dyn TokenVerifier, token: &str, timeout: Duration) -> bool {
    verify_credential(verifier, token, timeout).await.is_some()
}

/// ID token claims we rely on
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    n: Option<String>,
    e: Option<String>,
}

/// Verifies Firebase ID tokens (RS256) against the published signing keys.
///
/// Keys are cached by `kid` and refetched when a token names an unknown key.
pub struct FirebaseTokenVerifier {
    project_id: String,
    jwks_url: String,
    http_client: reqwest::Client,
    keys: RwLock<HashMap<String, DecodingKey>>,
}

impl FirebaseTokenVerifier {
    pub fn new(project_id: impl Into<String>, jwks_url: impl Into<String>) -> Result<Self, AuthError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AuthError::HttpError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            project_id: project_id.into(),
            jwks_url: jwks_url.into(),
            http_client,
            keys: RwLock::new(HashMap::new()),
        })
    }

    fn issuer(&self) -> String {
        format!("{}/{}", SECURE_TOKEN_ISSUER, self.project_id)
    }

    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        if let Some(key) = self.keys.read().await.get(kid) {
            return Ok(key.clone());
        }

        self.refresh_keys().await?;

        self.keys
            .read()
            .await
            .get(kid)
            .cloned()
            .ok_or_else(|| AuthError::UnknownSigningKey(kid.to_string()))
    }

    async fn refresh_keys(&self) -> Result<(), AuthError> {
        debug!("Fetching signing keys from {}", self.jwks_url);

        let jwks = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await?
            .error_for_status()?
            .json::<Jwks>()
            .await?;

        let mut fresh = HashMap::new();
        for jwk in jwks.keys {
            let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
                continue;
            };
            if jwk.kty != "RSA" {
                continue;
            }
            match DecodingKey::from_rsa_components(n, e) {
                Ok(key) => {
                    fresh.insert(jwk.kid, key);
                }
                Err(e) => warn!(kid = %jwk.kid, "skipping unusable signing key: {}", e),
            }
        }

        *self.keys.write().await = fresh;
        Ok(())
    }
}

#[async_trait]
impl TokenVerifier for FirebaseTokenVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        let header = decode_header(token)?;

        if header.alg != Algorithm::RS256 {
            return Err(AuthError::InvalidToken(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("missing key ID (kid)".to_string()))?;

        let decoding_key = self.decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[self.issuer()]);
        validation.set_required_spec_claims(&["exp", "sub", "aud", "iss"]);

        let claims = decode::<IdTokenClaims>(token, &decoding_key, &validation)?.claims;

        if claims.sub.is_empty() {
            return Err(AuthError::InvalidToken("empty subject".to_string()));
        }

        Ok(VerifiedToken {
            uid: claims.sub,
            email: claims.email,
        })
    }
}
