mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use taskdeck::auth::{AuthError, ProfileStore};
use taskdeck::auth::identity::ProfileRegistration;
use taskdeck::backend::{BackendClient, BackendError};
use tower::ServiceExt;

const SESSION: &str = "token=valid-token";

async fn backend() -> (BackendClient, MockServer, Writes) {
    let (router, writes) = mock_backend();
    let server = MockServer::start(router).await.expect("mock backend");
    let client = BackendClient::new(&server.base_url(), Duration::from_secs(5)).expect("client");
    (client, server, writes)
}

/// App wired to a running mock backend
async fn dashboard_app() -> (axum::Router, MockServer, Writes) {
    let (router, writes) = mock_backend();
    let server = MockServer::start(router).await.expect("mock backend");
    let app = app_with(
        Arc::new(StaticVerifier::default()),
        &test_config(),
        &server.base_url(),
    );
    (app, server, writes)
}

fn task_ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .expect("task list")
        .iter()
        .map(|t| t["task_id"].as_i64().expect("task id"))
        .collect()
}

#[tokio::test]
async fn fetches_profile_for_uid() {
    let (client, _server, _) = backend().await;

    let identity = client.fetch_user(TEST_UID).await.unwrap();

    assert_eq!(identity.user_id, 42);
    assert_eq!(identity.name, "Ayu");
    assert_eq!(identity.email.as_deref(), Some(TEST_EMAIL));
}

#[tokio::test]
async fn missing_profile_is_profile_not_found() {
    let (client, _server, _) = backend().await;

    let err = client.fetch_user("nobody").await.unwrap_err();
    assert!(err.is_not_found());

    let err = client.fetch_profile("nobody").await.unwrap_err();
    assert!(matches!(err, AuthError::ProfileNotFound(ref uid) if uid == "nobody"));
}

#[tokio::test]
async fn registers_profile() {
    let (client, _server, writes) = backend().await;

    client
        .register_profile(ProfileRegistration {
            token: "id-token".to_string(),
            uid: "uid-new".to_string(),
            name: "Budi".to_string(),
            email: "budi@example.com".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(
        writes.all(),
        vec![(
            "POST /auth/register".to_string(),
            json!({"token": "id-token", "uid": "uid-new", "name": "Budi", "email": "budi@example.com"})
        )]
    );
}

#[tokio::test]
async fn null_task_list_is_empty() {
    let (client, _server, _) = backend().await;

    assert_eq!(client.list_tasks(42).await.unwrap().len(), 3);
    assert!(client.list_tasks(7).await.unwrap().is_empty());
}

#[tokio::test]
async fn reads_dashboard_data() {
    let (client, _server, _) = backend().await;

    let categories = client.list_categories().await.unwrap();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[1].name, "Keuangan");

    let stats = client.dashboard_stats(TEST_UID).await.unwrap();
    assert_eq!(stats.total_tasks, 3);
    assert_eq!(stats.completion_stats.completed, 1);

    let weather = client.weather().await.unwrap();
    assert_eq!(weather.temperature(), 31);
    assert_eq!(weather.data.name, "Jakarta");
}

#[tokio::test]
async fn unreachable_backend_is_request_failure() {
    let client = BackendClient::new(UNREACHABLE_URL, Duration::from_secs(5)).unwrap();

    let err = client.list_categories().await.unwrap_err();
    assert!(matches!(err, BackendError::RequestFailed(_)), "{:?}", err);

    let err = client.fetch_profile(TEST_UID).await.unwrap_err();
    assert!(matches!(err, AuthError::Backend(_)), "{:?}", err);
}

#[tokio::test]
async fn task_list_defaults_to_active_by_due_date() {
    let (app, _server, _) = dashboard_app().await;

    let response = app
        .oneshot(get_with_cookie("/dashboard/api/tasks", Some(SESSION)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(task_ids(&body_json(response).await), vec![1, 3]);
}

#[tokio::test]
async fn task_list_applies_filters_and_sort() {
    let (app, _server, _) = dashboard_app().await;

    let cases = [
        ("status=all", vec![2, 1, 3]),
        ("status=all&sort=created_at&dir=desc", vec![3, 2, 1]),
        ("status=all&q=KEUANGAN", vec![1]),
        ("status=Done", vec![2]),
        ("status=all&priority=Medium", vec![3]),
        ("category=2", vec![1]),
    ];

    for (query, expected) in cases {
        let response = app
            .clone()
            .oneshot(get_with_cookie(
                &format!("/dashboard/api/tasks?{}", query),
                Some(SESSION),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", query);
        assert_eq!(task_ids(&body_json(response).await), expected, "{}", query);
    }
}

#[tokio::test]
async fn create_task_sends_local_due_date_as_utc() {
    let (app, _server, writes) = dashboard_app().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/dashboard/api/tasks",
            Some(SESSION),
            r#"{"title":"  Rapat tim ","priority":"High","category_id":1,"due_date":"2024-05-10T09:00"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await, json!({"ok": true}));
    assert_eq!(
        writes.all(),
        vec![(
            "POST /tasks".to_string(),
            json!({
                "title": "Rapat tim",
                "description": null,
                "status": "Todo",
                "user_id": 42,
                "category_id": 1,
                "priority": "High",
                "due_date": "2024-05-10T02:00:00.000Z",
                "completed_at": null
            })
        )]
    );
}

#[tokio::test]
async fn blank_title_is_rejected_before_the_backend() {
    let (app, _server, writes) = dashboard_app().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/dashboard/api/tasks",
            Some(SESSION),
            r#"{"title":"   "}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["message"], "Title is required.");
    assert!(writes.all().is_empty());
}

#[tokio::test]
async fn marking_done_keeps_the_rest_of_the_task() {
    let (app, _server, writes) = dashboard_app().await;

    let response = app
        .oneshot(json_request("POST", "/dashboard/api/tasks/1/done", Some(SESSION), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let writes = writes.all();
    assert_eq!(writes.len(), 1);
    let (call, body) = &writes[0];
    assert_eq!(call, "PUT /tasks/1");
    assert_eq!(body["status"], "Done");
    assert_eq!(body["title"], "Bayar pajak");
    assert_eq!(body["description"], "SPT tahunan");
    assert_eq!(body["category_id"], 2);
    assert_eq!(body["priority"], "High");
    assert_eq!(body["due_date"], "2024-05-10T00:00:00.000Z");
    assert!(body["completed_at"].is_string());
}

#[tokio::test]
async fn marking_unknown_task_done_is_404() {
    let (app, _server, writes) = dashboard_app().await;

    let response = app
        .oneshot(json_request("POST", "/dashboard/api/tasks/99/done", Some(SESSION), ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(writes.all().is_empty());
}

#[tokio::test]
async fn delete_is_forwarded() {
    let (app, _server, writes) = dashboard_app().await;

    let response = app
        .oneshot(json_request("DELETE", "/dashboard/api/tasks/3", Some(SESSION), ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(writes.all(), vec![("DELETE /tasks/3".to_string(), Value::Null)]);
}

#[tokio::test]
async fn update_foreign_task_is_404() {
    let (app, _server, writes) = dashboard_app().await;

    let response = app
        .oneshot(json_request(
            "PUT",
            "/dashboard/api/tasks/99",
            Some(SESSION),
            r#"{"title":"Bukan punyaku"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(writes.all().is_empty());
}

#[tokio::test]
async fn delete_foreign_task_is_404() {
    let (app, _server, writes) = dashboard_app().await;

    let response = app
        .oneshot(json_request("DELETE", "/dashboard/api/tasks/99", Some(SESSION), ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(writes.all().is_empty());
}

#[tokio::test]
async fn update_own_task_is_forwarded() {
    let (app, _server, writes) = dashboard_app().await;

    let response = app
        .oneshot(json_request(
            "PUT",
            "/dashboard/api/tasks/3",
            Some(SESSION),
            r#"{"title":"Tulis laporan akhir","status":"In Progress"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let writes = writes.all();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, "PUT /tasks/3");
    assert_eq!(writes[0].1["title"], "Tulis laporan akhir");
    assert_eq!(writes[0].1["user_id"], 42);
}

#[tokio::test]
async fn weather_card_summary() {
    let (app, _server, _) = dashboard_app().await;

    let response = app
        .oneshot(get_with_cookie("/dashboard/api/weather", Some(SESSION)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "city": "Jakarta",
            "temperature": 31,
            "condition": "awan mendung",
            "icon_url": "https://openweathermap.org/img/wn/04d@4x.png",
            "last_sync": "2024-05-01T08:00:00.000Z"
        })
    );
}

#[tokio::test]
async fn unreachable_backend_is_bad_gateway() {
    let app = app(Arc::new(StaticVerifier::default()));

    let response = app
        .oneshot(get_with_cookie("/dashboard/api/categories", Some(SESSION)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["error"]["code"], "BAD_GATEWAY");
}

#[tokio::test]
async fn dashboard_api_requires_a_session() {
    let (app, _server, _) = dashboard_app().await;

    let response = app
        .oneshot(get_with_cookie("/dashboard/api/tasks", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/auth/login"));
}
