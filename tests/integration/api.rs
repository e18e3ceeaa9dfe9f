//! API integration tests.
//!
//! These tests drive the router directly and verify endpoint behavior.

use recurrente::api::{ApiState, build_router, create_api_state};
use recurrente::{InMemoryStore, Scheduler, TransactionState, TransactionStore};

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{Datelike, NaiveDate, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use crate::common::{Script, ScriptedClient, sample_record};

/// Create a test API state backed by an in-memory store and scripted client.
async fn create_test_state(script: Vec<Script>) -> (ApiState<InMemoryStore>, Arc<ScriptedClient>) {
    let store = Arc::new(InMemoryStore::new());
    store.save(sample_record("rec-001")).await.unwrap();
    store
        .save(sample_record("rec-off").with_state(TransactionState::Inactive))
        .await
        .unwrap();

    let client = ScriptedClient::new(script);
    let scheduler = Scheduler::with_shared(Arc::clone(&store), Arc::clone(&client));
    let (handle, _task) = scheduler.start();

    (create_api_state(handle, store), client)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (state, _client) = create_test_state(Vec::new()).await;
    let router = build_router(state);

    let response = router.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_scheduler_state_endpoint() {
    let (state, _client) = create_test_state(Vec::new()).await;
    let router = build_router(state);

    let response = router.oneshot(get("/api/scheduler/state")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["state"], "running");
    assert_eq!(json["is_running"], true);
    assert_eq!(json["is_paused"], false);
}

#[tokio::test]
async fn test_pause_and_resume_endpoints() {
    let (state, _client) = create_test_state(Vec::new()).await;
    let router = build_router(state);

    let response = router
        .clone()
        .oneshot(post("/api/scheduler/pause"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(get("/api/scheduler/state"))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["is_paused"], true);

    let response = router
        .clone()
        .oneshot(post("/api/scheduler/resume"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router.oneshot(get("/api/scheduler/state")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["is_running"], true);
}

#[tokio::test]
async fn test_list_transactions_endpoint() {
    let (state, _client) = create_test_state(Vec::new()).await;
    let router = build_router(state);

    let response = router.oneshot(get("/api/transactions")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["count"], 2);
    assert!(json["transactions"].is_array());
}

#[tokio::test]
async fn test_get_transaction_endpoint() {
    let (state, _client) = create_test_state(Vec::new()).await;
    let router = build_router(state);

    let response = router
        .clone()
        .oneshot(get("/api/transactions/rec-001"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["code"], "rec-001");
    assert_eq!(json["state"], "ACT");
    assert_eq!(json["card_last_four"], "0366");
    assert_eq!(json["interval_minutes"], 30);

    let response = router
        .oneshot(get("/api/transactions/unknown"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_transaction_endpoint() {
    let (state, _client) = create_test_state(Vec::new()).await;
    let store = Arc::clone(&state.store);
    let router = build_router(state);

    let response = router
        .oneshot(post_json(
            "/api/transactions",
            json!({
                "amount": "75.50",
                "currency": "USD",
                "country": "EC",
                "brand": "MASTERCARD",
                "interval_minutes": 60,
                "start_date": "2024-06-01"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["state"], "ACT");
    assert_eq!(json["currency"], "USD");
    let code = json["code"].as_str().unwrap();
    assert_eq!(code.len(), 10);

    // The record is persisted.
    let records = store.find_all().await.unwrap();
    assert_eq!(records.len(), 3);
}

#[tokio::test]
async fn test_create_transaction_validation() {
    let (state, _client) = create_test_state(Vec::new()).await;
    let router = build_router(state);

    // Amount over the limit.
    let response = router
        .clone()
        .oneshot(post_json(
            "/api/transactions",
            json!({
                "amount": "100001",
                "currency": "USD",
                "start_date": "2024-06-01"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // End date before start date.
    let response = router
        .clone()
        .oneshot(post_json(
            "/api/transactions",
            json!({
                "amount": "10.00",
                "currency": "USD",
                "start_date": "2024-06-01",
                "end_date": "2024-01-01"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Pay day out of range.
    let response = router
        .clone()
        .oneshot(post_json(
            "/api/transactions",
            json!({
                "amount": "10.00",
                "currency": "USD",
                "start_date": "2024-06-01",
                "pay_day_of_month": 32
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Interval past the supported maximum.
    let response = router
        .clone()
        .oneshot(post_json(
            "/api/transactions",
            json!({
                "amount": "10.00",
                "currency": "USD",
                "start_date": "2024-06-01",
                "interval_minutes": i64::MAX
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Card expiry in the past.
    let response = router
        .oneshot(post_json(
            "/api/transactions",
            json!({
                "amount": "10.00",
                "currency": "USD",
                "start_date": "2024-06-01",
                "card_number": 4111111111111111u64,
                "card_expiry": "2020-01-01",
                "cvv": "123"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_run_transaction_endpoint() {
    let (state, client) = create_test_state(Vec::new()).await;
    let router = build_router(state);

    let response = router
        .clone()
        .oneshot(post("/api/executions/run/rec-001"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["code"], "rec-001");
    assert!(json["submission_id"].is_string());
    assert_eq!(client.submission_count(), 1);

    // Unknown record maps to 404.
    let response = router
        .clone()
        .oneshot(post("/api/executions/run/unknown"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Inactive record maps to 400.
    let response = router
        .oneshot(post("/api/executions/run/rec-off"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_run_transaction_upstream_failure_maps_to_bad_gateway() {
    let (state, _client) = create_test_state(vec![Script::Reject(503)]).await;
    let router = build_router(state);

    let response = router
        .oneshot(post("/api/executions/run/rec-001"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_GATEWAY");
    assert!(json["error"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn test_run_due_today_endpoint() {
    let (state, client) = create_test_state(Vec::new()).await;
    let store = Arc::clone(&state.store);

    let today = Utc::now().date_naive().day();
    store
        .save(sample_record("due-today").with_pay_day(today))
        .await
        .unwrap();

    let router = build_router(state);
    let response = router.oneshot(post("/api/executions/run")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["submitted"], 1);
    assert_eq!(json["outcomes"][0]["code"], "due-today");
    assert!(json["outcomes"][0]["submission_id"].is_string());
    assert_eq!(client.submission_count(), 1);
}

#[tokio::test]
async fn test_expired_record_with_todays_pay_day_is_skipped() {
    let (state, client) = create_test_state(Vec::new()).await;
    let store = Arc::clone(&state.store);

    let today = Utc::now().date_naive().day();
    store
        .save(
            sample_record("ended")
                .with_pay_day(today)
                .with_end_date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()),
        )
        .await
        .unwrap();

    let router = build_router(state);
    let response = router.oneshot(post("/api/executions/run")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["count"], 0);
    assert_eq!(client.submission_count(), 0);
}
