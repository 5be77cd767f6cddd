use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Error classification for JSON error bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors (4xx)
    ValidationError,
    Unauthorized,
    NotFound,
    MethodNotAllowed,

    // Server errors (5xx)
    BadGateway,
    GatewayTimeout,
}

impl ErrorCode {
    pub fn status(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 400,
            ErrorCode::Unauthorized => 401,
            ErrorCode::NotFound => 404,
            ErrorCode::MethodNotAllowed => 405,
            ErrorCode::BadGateway => 502,
            ErrorCode::GatewayTimeout => 504,
        }
    }
}

/// Structured error response format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
    pub status: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub request_id: String,
    pub timestamp: String,
    pub path: String,
}

pub struct ErrorResponseBuilder {
    code: ErrorCode,
    message: String,
    details: Option<String>,
    request_id: String,
    path: String,
}

impl ErrorResponseBuilder {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            request_id: "unknown".to_string(),
            path: "/".to_string(),
        }
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn build(self) -> ErrorResponse {
        ErrorResponse {
            status: self.code.status(),
            error: ErrorDetails {
                code: self.code,
                message: self.message,
                details: self.details,
                request_id: self.request_id,
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                path: self.path,
            },
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Helper functions for common error types
pub mod errors {
    use super::*;
    use crate::backend::{BackendError, gateway_status};

    pub fn not_found(path: &str, request_id: &str) -> ErrorResponse {
        ErrorResponseBuilder::new(ErrorCode::NotFound, "Resource not found")
            .path(path)
            .request_id(request_id)
            .build()
    }

    pub fn method_not_allowed(path: &str, request_id: &str) -> ErrorResponse {
        ErrorResponseBuilder::new(ErrorCode::MethodNotAllowed, "Method not allowed")
            .path(path)
            .request_id(request_id)
            .build()
    }

    pub fn validation(path: &str, message: &str, request_id: &str) -> ErrorResponse {
        ErrorResponseBuilder::new(ErrorCode::ValidationError, message)
            .path(path)
            .request_id(request_id)
            .build()
    }

    pub fn unauthorized(path: &str, request_id: &str) -> ErrorResponse {
        ErrorResponseBuilder::new(ErrorCode::Unauthorized, "Not signed in")
            .path(path)
            .request_id(request_id)
            .build()
    }

    /// A backend call made on the caller's behalf failed
    pub fn backend_failure(path: &str, err: &BackendError, request_id: &str) -> ErrorResponse {
        let code = match gateway_status(err) {
            StatusCode::NOT_FOUND => ErrorCode::NotFound,
            StatusCode::GATEWAY_TIMEOUT => ErrorCode::GatewayTimeout,
            _ => ErrorCode::BadGateway,
        };

        ErrorResponseBuilder::new(code, "Backend request failed")
            .details(err.to_string())
            .path(path)
            .request_id(request_id)
            .build()
    }
}
