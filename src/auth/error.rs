// Authentication Error Types
// Error handling for credential checks, token verification and session plumbing

use serde::Serialize;
use thiserror::Error;

/// Identity provider rejection codes, named the way the provider SDK names them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProviderErrorCode {
    #[serde(rename = "auth/user-not-found")]
    UserNotFound,
    #[serde(rename = "auth/wrong-password")]
    WrongPassword,
    #[serde(rename = "auth/invalid-email")]
    InvalidEmail,
    #[serde(rename = "auth/user-disabled")]
    UserDisabled,
    #[serde(rename = "auth/too-many-requests")]
    TooManyRequests,
    #[serde(rename = "auth/invalid-credential")]
    InvalidCredential,
    #[serde(rename = "auth/email-already-in-use")]
    EmailAlreadyInUse,
    #[serde(rename = "auth/weak-password")]
    WeakPassword,
    #[serde(rename = "auth/internal-error")]
    Unknown,
}

impl ProviderErrorCode {
    /// Map an Identity Toolkit error message (e.g. `"WEAK_PASSWORD : Password
    /// should be at least 6 characters"`) to a code. Only the token before the
    /// first space is significant.
    pub fn from_provider_message(message: &str) -> Self {
        let key = message.split_whitespace().next().unwrap_or_default();
        match key {
            "EMAIL_NOT_FOUND" => Self::UserNotFound,
            "INVALID_PASSWORD" => Self::WrongPassword,
            "INVALID_EMAIL" => Self::InvalidEmail,
            "USER_DISABLED" => Self::UserDisabled,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyRequests,
            "INVALID_LOGIN_CREDENTIALS" | "INVALID_IDP_RESPONSE" => Self::InvalidCredential,
            "EMAIL_EXISTS" => Self::EmailAlreadyInUse,
            "WEAK_PASSWORD" => Self::WeakPassword,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserNotFound => "auth/user-not-found",
            Self::WrongPassword => "auth/wrong-password",
            Self::InvalidEmail => "auth/invalid-email",
            Self::UserDisabled => "auth/user-disabled",
            Self::TooManyRequests => "auth/too-many-requests",
            Self::InvalidCredential => "auth/invalid-credential",
            Self::EmailAlreadyInUse => "auth/email-already-in-use",
            Self::WeakPassword => "auth/weak-password",
            Self::Unknown => "auth/internal-error",
        }
    }
}

impl std::fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    // Credential errors
    #[error("Identity provider rejected the request: {0}")]
    Provider(ProviderErrorCode),

    #[error("Missing session credential")]
    MissingCredential,

    // Token-related errors
    #[error("Invalid ID token: {0}")]
    InvalidToken(String),

    #[error("ID token expired")]
    TokenExpired,

    #[error("Signing key {0} not found")]
    UnknownSigningKey(String),

    // Backend errors
    #[error("User profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Backend request failed: {0}")]
    Backend(String),

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    InvalidConfig { key: String, reason: String },

    // Network/HTTP errors
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),

    #[error("Provider communication timeout")]
    Timeout,
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AuthError::Timeout
        } else {
            AuthError::HttpError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::JsonError(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken(err.to_string()),
        }
    }
}

impl AuthError {
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::Provider(ProviderErrorCode::TooManyRequests) => 429,

            AuthError::Provider(_)
            | AuthError::MissingCredential
            | AuthError::InvalidToken(_)
            | AuthError::TokenExpired
            | AuthError::UnknownSigningKey(_) => 401,

            AuthError::ProfileNotFound(_) => 404,

            AuthError::InvalidConfig { .. } => 500,

            AuthError::Backend(_) | AuthError::HttpError(_) | AuthError::JsonError(_) => 502,

            AuthError::Timeout => 504,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::Timeout | AuthError::HttpError(_))
    }

    /// Provider code, when this is a credential rejection
    pub fn provider_code(&self) -> Option<ProviderErrorCode> {
        match self {
            AuthError::Provider(code) => Some(*code),
            _ => None,
        }
    }
}
