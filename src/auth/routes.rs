/// Authentication API Routes
///
/// `POST /check` answers whether a credential verifies; `/session` writes or
/// clears the session cookie. Bodies are parsed by hand so malformed JSON gets
/// the endpoint's own answer instead of the extractor's rejection.
use crate::auth::cookies::SessionCookies;
use crate::auth::verifier::{TokenVerifier, check_credential};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Shared state for the auth API
pub struct AuthApi {
    verifier: Arc<dyn TokenVerifier>,
    cookies: SessionCookies,
    timeout: Duration,
}

impl AuthApi {
    pub fn new(verifier: Arc<dyn TokenVerifier>, cookies: SessionCookies, timeout: Duration) -> Self {
        Self {
            verifier,
            cookies,
            timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    token: Option<String>,
}

impl TokenBody {
    /// Any JSON value; only a string `token` member of an object counts
    fn from_value(value: &Value) -> Self {
        Self {
            token: value.get("token").and_then(Value::as_str).map(str::to_string),
        }
    }

    fn non_empty(self) -> Option<String> {
        self.token.filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub valid: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl SessionResponse {
    fn ok() -> Json<Self> {
        Json(Self {
            ok: true,
            error: None,
        })
    }
}

/// `POST /check`
async fn check_token(State(api): State<Arc<AuthApi>>, body: Bytes) -> (StatusCode, Json<CheckResponse>) {
    let body = match serde_json::from_slice::<TokenBody>(&body) {
        Ok(body) => body,
        Err(e) => {
            debug!("check: unreadable body: {}", e);
            return (StatusCode::OK, Json(CheckResponse { valid: false }));
        }
    };

    let Some(token) = body.non_empty() else {
        return (StatusCode::BAD_REQUEST, Json(CheckResponse { valid: false }));
    };

    let valid = check_credential(api.verifier.as_ref(), &token, api.timeout).await;
    (StatusCode::OK, Json(CheckResponse { valid }))
}

/// `POST /session`
async fn create_session(State(api): State<Arc<AuthApi>>, jar: CookieJar, body: Bytes) -> Response {
    let body = match serde_json::from_slice::<Value>(&body) {
        Ok(value) => TokenBody::from_value(&value),
        Err(e) => {
            debug!("session: unreadable body: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SessionResponse {
                    ok: false,
                    error: Some("invalid"),
                }),
            )
                .into_response();
        }
    };

    let Some(token) = body.non_empty() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(SessionResponse {
                ok: false,
                error: None,
            }),
        )
            .into_response();
    };

    info!("session cookie issued");
    (jar.add(api.cookies.set_session(&token)), SessionResponse::ok()).into_response()
}

/// `DELETE /session`
async fn delete_session(State(api): State<Arc<AuthApi>>, jar: CookieJar) -> Response {
    info!("session cookie cleared");
    (jar.add(api.cookies.clear_session()), SessionResponse::ok()).into_response()
}

/// Routes relative to the mount point (`/api/auth`)
pub fn create_auth_router(api: Arc<AuthApi>) -> Router {
    Router::new()
        .route("/check", post(check_token))
        .route("/session", post(create_session).delete(delete_session))
        .with_state(api)
}
