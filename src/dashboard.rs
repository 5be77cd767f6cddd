//! Dashboard data API
//!
//! JSON endpoints under `/dashboard/api`, behind the route gate. Each call is
//! made to the backend on behalf of the signed-in user the gate verified.

use crate::auth::verifier::VerifiedToken;
use crate::backend::{BackendClient, BackendError};
use crate::error::{ErrorResponse, errors};
use crate::middleware::RequestId;
use crate::tasks::{
    Category, DashboardStats, SortDirection, SortKey, StatusFilter, Task, TaskDraft, TaskFilter,
    TaskPriority, TaskSort, mark_done, visible_tasks,
};
use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, Query, State},
    http::{StatusCode, request::Parts},
    routing::{get, post, put},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// The verified user making a dashboard API call
pub struct Caller {
    pub uid: String,
    pub request_id: String,
    pub path: String,
}

impl Caller {
    fn backend_error(&self, err: BackendError) -> ErrorResponse {
        errors::backend_failure(&self.path, &err, &self.request_id)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ErrorResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = parts
            .extensions
            .get::<RequestId>()
            .map(|id| id.0.clone())
            .unwrap_or_else(|| "unknown".to_string());
        let path = parts.uri.path().to_string();

        match parts.extensions.get::<VerifiedToken>() {
            Some(verified) => Ok(Caller {
                uid: verified.uid.clone(),
                request_id,
                path,
            }),
            None => Err(errors::unauthorized(&path, &request_id)),
        }
    }
}

type ApiResult<T> = Result<T, ErrorResponse>;

#[derive(Debug, Serialize)]
pub struct Ack {
    pub ok: bool,
}

/// Weather card contents
#[derive(Debug, Serialize)]
pub struct WeatherSummary {
    pub city: String,
    pub temperature: i64,
    pub condition: Option<String>,
    pub icon_url: Option<String>,
    pub last_sync: String,
}

/// `GET /dashboard/api/tasks` query string
#[derive(Debug, Default, Deserialize)]
pub struct TaskQuery {
    pub status: Option<String>,
    pub category: Option<i64>,
    pub priority: Option<TaskPriority>,
    pub q: Option<String>,
    pub sort: Option<SortKey>,
    pub dir: Option<SortDirection>,
}

impl TaskQuery {
    pub fn filter(&self) -> TaskFilter {
        TaskFilter {
            status: self
                .status
                .as_deref()
                .and_then(StatusFilter::from_param)
                .unwrap_or_default(),
            category_id: self.category,
            priority: self.priority,
            search: self.q.clone().unwrap_or_default(),
        }
    }

    pub fn sort(&self) -> TaskSort {
        TaskSort {
            key: self.sort.unwrap_or_default(),
            direction: self.dir.unwrap_or_default(),
        }
    }
}

async fn user_id(backend: &BackendClient, caller: &Caller) -> ApiResult<i64> {
    backend
        .fetch_user(&caller.uid)
        .await
        .map(|identity| identity.user_id)
        .map_err(|e| caller.backend_error(e))
}

/// The caller's task `task_id`; anyone else's task is a 404
async fn owned_task(
    backend: &BackendClient,
    caller: &Caller,
    user_id: i64,
    task_id: i64,
) -> ApiResult<Task> {
    backend
        .list_tasks(user_id)
        .await
        .map_err(|e| caller.backend_error(e))?
        .into_iter()
        .find(|t| t.id == task_id)
        .ok_or_else(|| errors::not_found(&caller.path, &caller.request_id))
}

async fn stats(
    State(backend): State<Arc<BackendClient>>,
    caller: Caller,
) -> ApiResult<Json<DashboardStats>> {
    let stats = backend
        .dashboard_stats(&caller.uid)
        .await
        .map_err(|e| caller.backend_error(e))?;
    Ok(Json(stats))
}

async fn weather(
    State(backend): State<Arc<BackendClient>>,
    caller: Caller,
) -> ApiResult<Json<WeatherSummary>> {
    let report = backend.weather().await.map_err(|e| caller.backend_error(e))?;

    Ok(Json(WeatherSummary {
        temperature: report.temperature(),
        icon_url: report.icon_url(),
        condition: report.data.weather.first().map(|w| w.description.clone()),
        city: report.data.name,
        last_sync: report.last_sync,
    }))
}

async fn categories(
    State(backend): State<Arc<BackendClient>>,
    caller: Caller,
) -> ApiResult<Json<Vec<Category>>> {
    let categories = backend
        .list_categories()
        .await
        .map_err(|e| caller.backend_error(e))?;
    Ok(Json(categories))
}

async fn list_tasks(
    State(backend): State<Arc<BackendClient>>,
    caller: Caller,
    Query(query): Query<TaskQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let user_id = user_id(&backend, &caller).await?;
    let tasks = backend
        .list_tasks(user_id)
        .await
        .map_err(|e| caller.backend_error(e))?;

    let visible = visible_tasks(&tasks, &query.filter(), query.sort());
    debug!(total = tasks.len(), visible = visible.len(), "listed tasks");
    Ok(Json(visible.into_iter().cloned().collect()))
}

async fn create_task(
    State(backend): State<Arc<BackendClient>>,
    caller: Caller,
    Json(draft): Json<TaskDraft>,
) -> ApiResult<(StatusCode, Json<Ack>)> {
    let user_id = user_id(&backend, &caller).await?;
    let payload = draft
        .into_payload(user_id, Utc::now())
        .map_err(|e| errors::validation(&caller.path, &e.to_string(), &caller.request_id))?;

    backend
        .create_task(&payload)
        .await
        .map_err(|e| caller.backend_error(e))?;

    info!(user_id, "task created");
    Ok((StatusCode::CREATED, Json(Ack { ok: true })))
}

async fn update_task(
    State(backend): State<Arc<BackendClient>>,
    caller: Caller,
    Path(task_id): Path<i64>,
    Json(draft): Json<TaskDraft>,
) -> ApiResult<Json<Ack>> {
    let user_id = user_id(&backend, &caller).await?;
    let payload = draft
        .into_payload(user_id, Utc::now())
        .map_err(|e| errors::validation(&caller.path, &e.to_string(), &caller.request_id))?;
    owned_task(&backend, &caller, user_id, task_id).await?;

    backend
        .update_task(task_id, &payload)
        .await
        .map_err(|e| caller.backend_error(e))?;

    info!(task_id, "task updated");
    Ok(Json(Ack { ok: true }))
}

async fn complete_task(
    State(backend): State<Arc<BackendClient>>,
    caller: Caller,
    Path(task_id): Path<i64>,
) -> ApiResult<Json<Ack>> {
    let user_id = user_id(&backend, &caller).await?;
    let task = owned_task(&backend, &caller, user_id, task_id).await?;

    backend
        .update_task(task_id, &mark_done(&task, user_id, Utc::now()))
        .await
        .map_err(|e| caller.backend_error(e))?;

    info!(task_id, "task marked done");
    Ok(Json(Ack { ok: true }))
}

async fn delete_task(
    State(backend): State<Arc<BackendClient>>,
    caller: Caller,
    Path(task_id): Path<i64>,
) -> ApiResult<Json<Ack>> {
    let user_id = user_id(&backend, &caller).await?;
    owned_task(&backend, &caller, user_id, task_id).await?;

    backend
        .delete_task(task_id)
        .await
        .map_err(|e| caller.backend_error(e))?;

    info!(task_id, "task deleted");
    Ok(Json(Ack { ok: true }))
}

/// Routes relative to the mount point (`/dashboard/api`)
pub fn create_dashboard_router(backend: Arc<BackendClient>) -> Router {
    Router::new()
        .route("/stats", get(stats))
        .route("/weather", get(weather))
        .route("/categories", get(categories))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/{id}", put(update_task).delete(delete_task))
        .route("/tasks/{id}/done", post(complete_task))
        .with_state(backend)
}
