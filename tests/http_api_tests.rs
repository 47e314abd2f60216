use std::sync::Arc;

use axum::{
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use roadstats::{AppState, IdPolicy, RecordStore, build_router};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

fn app(dir: &TempDir) -> axum::Router {
    let store = RecordStore::open(dir.path().join("records.csv"), IdPolicy::ReuseMax)
        .expect("store should open");
    build_router(AppState::new(Arc::new(store)))
}

async fn send(app: &axum::Router, method: Method, uri: &str, body: Body) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .expect("request should build");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("response expected");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body should be readable");

    if body.is_empty() {
        return (status, Value::Null);
    }

    let json = serde_json::from_slice::<Value>(&body).expect("body should be valid JSON");
    (status, json)
}

async fn send_json(app: &axum::Router, method: Method, uri: &str, payload: Value) -> (StatusCode, Value) {
    send(app, method, uri, Body::from(payload.to_string())).await
}

async fn send_empty(app: &axum::Router, method: Method, uri: &str) -> (StatusCode, Value) {
    send(app, method, uri, Body::empty()).await
}

async fn create(app: &axum::Router, year: Value, month: &str, fatalities: i64) -> Value {
    let (status, body) = send_json(
        app,
        Method::POST,
        "/records",
        json!({ "year": year, "month": month, "fatalities": fatalities }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {body}");
    body["record"].clone()
}

#[tokio::test]
async fn create_and_get_record() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/records",
        json!({ "year": 2020, "month": "January", "fatalities": 9 }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Record created successfully");
    assert_eq!(body["record"]["id"], 1);

    let (status, fetched) = send_empty(&app, Method::GET, "/records?id=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        fetched,
        json!({ "id": 1, "year": 2020, "month": "January", "fatalities": 9 })
    );
}

#[tokio::test]
async fn list_returns_all_records_in_table_order() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    create(&app, json!(2021), "March", 4).await;
    create(&app, json!("2020"), "May", 2).await;

    let (status, body) = send_empty(&app, Method::GET, "/records").await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().expect("list should be an array");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["year"], 2021);
    assert_eq!(items[1]["year"], 2020);
}

#[tokio::test]
async fn get_unknown_or_invalid_id() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = send_empty(&app, Method::GET, "/records?id=42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (status, _) = send_empty(&app, Method::GET, "/records?id=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_validation_failures_are_bad_requests() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let cases = [
        json!({ "month": "January", "fatalities": 5 }),
        json!({ "year": 2020, "month": "January", "fatalities": -1 }),
        json!({ "year": 2020, "month": "Jan", "fatalities": 1 }),
        json!({ "year": 2020, "month": "January", "fatalities": "3" }),
        json!({ "id": 7, "year": 2020, "month": "January", "fatalities": 3 }),
    ];
    for payload in cases {
        let (status, body) = send_json(&app, Method::POST, "/records", payload.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload} gave {body}");
        assert_eq!(body["code"], "validation_error");
    }

    let (status, body) = send(&app, Method::POST, "/records", Body::from("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "input_error");

    let (_, list) = send_empty(&app, Method::GET, "/records").await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn update_record_partially() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    create(&app, json!(2022), "June", 12).await;

    let (status, body) = send_json(&app, Method::PUT, "/records/1", json!({ "fatalities": 15 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Record updated successfully");
    assert_eq!(
        body["record"],
        json!({ "id": 1, "year": 2022, "month": "June", "fatalities": 15 })
    );

    let (status, _) = send_json(&app, Method::PUT, "/records/9", json!({ "fatalities": 1 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_json(&app, Method::PUT, "/records/1", json!({ "fatalities": -2 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(&app, Method::PUT, "/records/1", json!({ "weather": "rain" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_record_and_reuse_id() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    create(&app, json!(2022), "June", 12).await;
    create(&app, json!(2022), "July", 8).await;

    let (status, body) = send_empty(&app, Method::DELETE, "/records/2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Record deleted successfully");

    let (status, _) = send_empty(&app, Method::GET, "/records?id=2").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_empty(&app, Method::DELETE, "/records/2").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let reused = create(&app, json!(2022), "August", 3).await;
    assert_eq!(reused["id"], 2);
}

#[tokio::test]
async fn grouped_view_sums_and_sorts() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    create(&app, json!(2020), "February", 19).await;
    create(&app, json!(2020), "January", 9).await;
    create(&app, json!(2020), "January", 5).await;

    let (status, body) = send_empty(&app, Method::GET, "/records/grouped").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            { "year": 2020, "month": "January", "fatalities": 14 },
            { "year": 2020, "month": "February", "fatalities": 19 }
        ])
    );
}

#[tokio::test]
async fn health_reports_record_count() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    create(&app, json!(2020), "March", 1).await;

    let (status, body) = send_empty(&app, Method::GET, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "records": 1 }));
}

#[tokio::test]
async fn oversized_fatalities_are_rejected_and_grouping_never_wraps() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/records",
        json!({ "year": 2020, "month": "May", "fatalities": u64::MAX }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    for _ in 0..3 {
        create(&app, json!(2020), "May", i64::MAX).await;
    }

    let (status, body) = send_empty(&app, Method::GET, "/records/grouped").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "internal_error");

    // Other routes keep working after the failed aggregation.
    let (status, body) = send_empty(&app, Method::GET, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["records"], 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_get_distinct_ids() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let mut tasks = tokio::task::JoinSet::new();
    for fatalities in 0..16 {
        let app = app.clone();
        tasks.spawn(async move { create(&app, json!(2021), "April", fatalities).await });
    }

    let mut ids = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let record = joined.expect("create task should finish");
        ids.push(record["id"].as_u64().expect("id should be a number"));
    }
    ids.sort_unstable();
    assert_eq!(ids, (1..=16).collect::<Vec<u64>>());

    let (_, list) = send_empty(&app, Method::GET, "/records").await;
    assert_eq!(list.as_array().map(Vec::len), Some(16));
}
