/// Route Gate
///
/// Runs before every page handler. Protected pages need a credential that
/// verifies; auth-only pages bounce already signed-in users to the dashboard.
/// Any verification outcome other than a positive answer counts as invalid.
use crate::auth::cookies::SessionCookies;
use crate::auth::verifier::{TokenVerifier, VerifiedToken, verify_credential};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const HOME_PATH: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Protected,
    AuthOnly,
    Unclassified,
}

impl RouteClass {
    /// Classify a request path. A single trailing slash is ignored.
    pub fn classify(path: &str) -> Self {
        let path = match path.strip_suffix('/') {
            Some(stripped) if !stripped.is_empty() => stripped,
            _ => path,
        };

        if path == HOME_PATH || path.starts_with("/dashboard/") {
            RouteClass::Protected
        } else if path == LOGIN_PATH || path == REGISTER_PATH {
            RouteClass::AuthOnly
        } else {
            RouteClass::Unclassified
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Let the request through; carries the identity when a credential verified
    Continue(Option<VerifiedToken>),
    RedirectToLogin { clear_cookie: bool },
    RedirectToHome,
}

pub struct RouteGate {
    verifier: Arc<dyn TokenVerifier>,
    cookies: SessionCookies,
    timeout: Duration,
}

impl RouteGate {
    pub fn new(verifier: Arc<dyn TokenVerifier>, cookies: SessionCookies, timeout: Duration) -> Self {
        Self {
            verifier,
            cookies,
            timeout,
        }
    }

    /// Decide what to do with a request for `path` carrying `credential`.
    pub async fn evaluate(&self, path: &str, credential: Option<&str>) -> GateDecision {
        let class = RouteClass::classify(path);
        if class == RouteClass::Unclassified {
            return GateDecision::Continue(None);
        }

        let Some(credential) = credential else {
            return match class {
                RouteClass::Protected => GateDecision::RedirectToLogin {
                    clear_cookie: false,
                },
                _ => GateDecision::Continue(None),
            };
        };

        match verify_credential(self.verifier.as_ref(), credential, self.timeout).await {
            None => GateDecision::RedirectToLogin { clear_cookie: true },
            Some(_) if class == RouteClass::AuthOnly => GateDecision::RedirectToHome,
            Some(verified) => GateDecision::Continue(Some(verified)),
        }
    }
}

/// Middleware applying [`RouteGate::evaluate`] to every request.
///
/// On `Continue` with a verified credential, the [`VerifiedToken`] is added to
/// the request extensions for the page handlers.
pub async fn route_gate(
    State(gate): State<Arc<RouteGate>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();

    if RouteClass::classify(&path) == RouteClass::Unclassified {
        return next.run(req).await;
    }

    let credential = gate.cookies.read(&jar);
    let decision = gate.evaluate(&path, credential.as_deref()).await;

    match decision {
        GateDecision::Continue(verified) => {
            debug!(%path, "gate: continue");
            if let Some(verified) = verified {
                req.extensions_mut().insert(verified);
            }
            next.run(req).await
        }
        GateDecision::RedirectToLogin { clear_cookie: true } => {
            warn!(%path, "gate: session credential rejected, clearing cookie");
            let jar = jar.add(gate.cookies.clear_session());
            (jar, Redirect::temporary(LOGIN_PATH)).into_response()
        }
        GateDecision::RedirectToLogin { clear_cookie: false } => {
            debug!(%path, "gate: no session, redirecting to login");
            Redirect::temporary(LOGIN_PATH).into_response()
        }
        GateDecision::RedirectToHome => {
            debug!(%path, "gate: already signed in, redirecting home");
            Redirect::temporary(HOME_PATH).into_response()
        }
    }
}
