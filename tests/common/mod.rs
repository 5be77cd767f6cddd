#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use taskdeck::auth::{AuthError, TokenVerifier, VerifiedToken};
use taskdeck::backend::BackendClient;
use taskdeck::config::Config;
use taskdeck::{AppServices, build_router};
use tokio::sync::oneshot;

pub const VALID_TOKEN: &str = "valid-token";
pub const TEST_UID: &str = "uid-1";
pub const TEST_EMAIL: &str = "ayu@example.com";

/// Nothing listens here; connections are refused immediately
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:9";

/// Accepts exactly [`VALID_TOKEN`], counting calls
#[derive(Default)]
pub struct StaticVerifier {
    calls: AtomicUsize,
}

impl StaticVerifier {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if token == VALID_TOKEN {
            Ok(VerifiedToken {
                uid: TEST_UID.to_string(),
                email: Some(TEST_EMAIL.to_string()),
            })
        } else {
            Err(AuthError::TokenExpired)
        }
    }
}

/// Every verification errors out
pub struct FailingVerifier;

#[async_trait]
impl TokenVerifier for FailingVerifier {
    async fn verify(&self, _token: &str) -> Result<VerifiedToken, AuthError> {
        Err(AuthError::HttpError("verification service unavailable".to_string()))
    }
}

/// Every verification hangs forever
pub struct HangingVerifier;

#[async_trait]
impl TokenVerifier for HangingVerifier {
    async fn verify(&self, _token: &str) -> Result<VerifiedToken, AuthError> {
        std::future::pending().await
    }
}

/// In-process HTTP server on a random port
pub struct MockServer {
    port: u16,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockServer {
    pub async fn start(app: Router) -> anyhow::Result<Self> {
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let port = listener.local_addr()?.port();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await;
        });

        Ok(Self {
            port,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

pub fn test_config() -> Config {
    let mut config = Config::test_config_with_port(0);
    config.gate.verify_timeout_ms = 200;
    config
}

/// The app with `verifier`, talking to a backend at `backend_url`
pub fn app_with(verifier: Arc<dyn TokenVerifier>, config: &Config, backend_url: &str) -> Router {
    let mut config = config.clone();
    config.backend.base_url = backend_url.to_string();
    let backend = BackendClient::from_config(&config).expect("backend client should build");

    build_router(
        &config,
        AppServices {
            verifier,
            backend: Arc::new(backend),
        },
    )
}

/// The app with `verifier` and no reachable backend
pub fn app(verifier: Arc<dyn TokenVerifier>) -> Router {
    app_with(verifier, &test_config(), UNREACHABLE_URL)
}

pub fn get_with_cookie(path: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request should build")
}

pub fn json_request(method: &str, path: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    String::from_utf8(bytes.to_vec()).expect("body should be UTF-8")
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).expect("body should be JSON")
}

pub fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// Writes the mock backend received: `(method path, body)`
#[derive(Clone, Default)]
pub struct Writes(Arc<Mutex<Vec<(String, Value)>>>);

impl Writes {
    fn push(&self, call: String, body: Value) {
        self.0.lock().expect("writes lock").push((call, body));
    }

    pub fn all(&self) -> Vec<(String, Value)> {
        self.0.lock().expect("writes lock").clone()
    }
}

pub fn sample_tasks() -> Value {
    json!([
        {
            "task_id": 1,
            "title": "Bayar pajak",
            "description": "SPT tahunan",
            "status": "Todo",
            "priority": "High",
            "due_date": "2024-05-10T00:00:00.000Z",
            "created_at": "2024-04-01T08:00:00.000Z",
            "completed_at": null,
            "category": {"category_id": 2, "name": "Keuangan", "color": "#ff0000"}
        },
        {
            "task_id": 2,
            "title": "Belanja",
            "description": null,
            "status": "Done",
            "priority": "Low",
            "due_date": "2024-05-01T00:00:00.000Z",
            "created_at": "2024-04-02T08:00:00.000Z",
            "completed_at": "2024-05-01T10:00:00.000Z",
            "category": null
        },
        {
            "task_id": 3,
            "title": "Tulis laporan",
            "description": null,
            "status": "In Progress",
            "priority": null,
            "due_date": null,
            "created_at": "2024-04-03T08:00:00.000Z",
            "completed_at": null,
            "category": null
        }
    ])
}

async fn user_profile(Path(uid): Path<String>) -> Response {
    if uid == TEST_UID {
        Json(json!({
            "data": {"userId": 42, "uid": uid, "email": TEST_EMAIL, "name": "Ayu"}
        }))
        .into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(json!({"message": "user not found"}))).into_response()
    }
}

/// Backend API stand-in; writes are recorded in the returned [`Writes`]
pub fn mock_backend() -> (Router, Writes) {
    let writes = Writes::default();

    let app = Router::new()
        .route("/auth/user/{uid}", get(user_profile))
        .route(
            "/auth/register",
            post(|State(w): State<Writes>, Json(body): Json<Value>| async move {
                w.push("POST /auth/register".to_string(), body);
                (StatusCode::CREATED, Json(json!({"message": "registered"})))
            }),
        )
        .route(
            "/users/{id}/tasks",
            get(|Path(id): Path<i64>| async move {
                if id == 42 {
                    Json(json!({"data": sample_tasks()}))
                } else {
                    Json(json!({"data": null}))
                }
            }),
        )
        .route(
            "/tasks",
            post(|State(w): State<Writes>, Json(body): Json<Value>| async move {
                w.push("POST /tasks".to_string(), body);
                (StatusCode::CREATED, Json(json!({"message": "created"})))
            }),
        )
        .route(
            "/tasks/{id}",
            put(
                |State(w): State<Writes>, Path(id): Path<i64>, Json(body): Json<Value>| async move {
                    w.push(format!("PUT /tasks/{}", id), body);
                    Json(json!({"message": "updated"}))
                },
            )
            .delete(|State(w): State<Writes>, Path(id): Path<i64>| async move {
                w.push(format!("DELETE /tasks/{}", id), Value::Null);
                Json(json!({"message": "deleted"}))
            }),
        )
        .route(
            "/categories",
            get(|| async {
                Json(json!({"data": [
                    {"category_id": 1, "name": "Kerja", "color": "#0000ff"},
                    {"category_id": 2, "name": "Keuangan", "color": "#ff0000"}
                ]}))
            }),
        )
        .route(
            "/dashboard/stats/{uid}",
            get(|Path(_uid): Path<String>| async {
                Json(json!({"data": {
                    "total_tasks": 3,
                    "tasks_by_priority": [{"priority": "High", "count": 1}],
                    "tasks_by_category": [{"category_name": "Keuangan", "count": 1}],
                    "completion_stats": {"total": 3, "completed": 1, "completion_rate": 33.3},
                    "tasks_due_today": 0
                }}))
            }),
        )
        .route(
            "/dashboard/weather",
            get(|| async {
                Json(json!({
                    "data": {
                        "main": {"temp": 30.6},
                        "weather": [{"main": "Clouds", "description": "awan mendung", "icon": "04d"}],
                        "name": "Jakarta"
                    },
                    "last_sync": "2024-05-01T08:00:00.000Z"
                }))
            }),
        )
        .with_state(writes.clone());

    (app, writes)
}
