use axum::{
    Router,
    extract::Request,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub mod auth;
pub mod backend;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod middleware;
pub mod pages;
pub mod tasks;

use auth::{AuthApi, FirebaseTokenVerifier, RouteGate, SessionCookies, TokenVerifier};
use backend::BackendClient;
use config::Config;
use error::{ErrorResponse, errors};
use middleware::RequestId;

/// Environment variable switching log output to JSON
pub const LOG_JSON_ENV: &str = "TASKDECK_LOG_JSON";

const DEFAULT_LOG_FILTER: &str = "info,taskdeck=debug";

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var(LOG_JSON_ENV).is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    };

    if let Err(e) = result {
        eprintln!("tracing already initialized: {}", e);
    }
}

/// Outbound collaborators of the web app
pub struct AppServices {
    pub verifier: Arc<dyn TokenVerifier>,
    pub backend: Arc<BackendClient>,
}

impl AppServices {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let verifier = FirebaseTokenVerifier::new(
            config.identity.project_id.clone(),
            config.identity.jwks_url.clone(),
        )?;
        let backend = BackendClient::from_config(config)?;

        Ok(Self {
            verifier: Arc::new(verifier),
            backend: Arc::new(backend),
        })
    }
}

fn request_id_of(request: &Request) -> String {
    request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_else(|| "unknown".to_string())
}

async fn not_found(request: Request) -> ErrorResponse {
    errors::not_found(request.uri().path(), &request_id_of(&request))
}

async fn method_not_allowed(request: Request) -> ErrorResponse {
    errors::method_not_allowed(request.uri().path(), &request_id_of(&request))
}

/// The full application: pages, auth API and dashboard API behind the route gate.
pub fn build_router(config: &Config, services: AppServices) -> Router {
    let cookies = SessionCookies::from_config(config);
    let timeout = config.verify_timeout();

    let gate = Arc::new(RouteGate::new(
        Arc::clone(&services.verifier),
        cookies.clone(),
        timeout,
    ));
    let auth_api = Arc::new(AuthApi::new(Arc::clone(&services.verifier), cookies, timeout));

    Router::new()
        .route("/", get(pages::home))
        .route("/auth/login", get(pages::login))
        .route("/auth/register", get(pages::register))
        .route("/dashboard", get(pages::dashboard))
        .route("/dashboard/{*rest}", get(pages::dashboard_section))
        .nest("/dashboard/api", dashboard::create_dashboard_router(services.backend))
        .nest("/api/auth", auth::create_auth_router(auth_api))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(from_fn_with_state(gate, auth::route_gate))
        .layer(TraceLayer::new_for_http().make_span_with(middleware::request_span))
        .layer(from_fn(middleware::request_id_middleware))
}

/// Serve `app` on `listener` until `shutdown_rx` fires.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> anyhow::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_rx.await.ok();
        })
        .await?;
    Ok(())
}

/// Starts the web server with the given configuration
pub async fn start_server_with_config(
    config: Config,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> anyhow::Result<()> {
    config.validate()?;

    let services = AppServices::from_config(&config)?;
    let app = build_router(&config, services);

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("listening on {}", listener.local_addr()?);
    debug!(
        "Server configuration - host: {}, port: {}, environment: {:?}",
        config.host, config.port, config.environment
    );

    serve(listener, app, shutdown_rx).await
}
