//! Integration tests for the student performance service.
//!
//! The HTTP tests drive the full router over the in-memory store. The
//! PostgreSQL tests require a reachable DATABASE_URL.
//! Run those with: cargo test --test integration -- --ignored

use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use student_performance::api::{cors_layer, create_router, AppState};
use student_performance::error::StorageError;
use student_performance::records::{AttainmentPolicy, StudentRecord, StudentService, TestEntry};
use student_performance::store::{MemoryStore, PgStore, StudentStore};

fn app(store: MemoryStore) -> Router {
    let state = AppState::new(StudentService::new(store, AttainmentPolicy::default()));
    create_router(state, cors_layer(None))
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn submit(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/add-student")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn strip_dates(tests: &Value) -> Vec<Value> {
    tests
        .as_array()
        .unwrap()
        .iter()
        .map(|t| json!({ "marks": t["marks"], "totalMarks": t["totalMarks"] }))
        .collect()
}

/// Ann submits twice, the second time by id only; her history comes back in
/// order under her original name.
#[tokio::test]
async fn test_submission_history_round_trip() {
    let app = app(MemoryStore::new());

    let first = json!({
        "studentId": "S1", "name": "Ann", "course": "CS1", "marks": 80, "totalMarks": 100
    });
    let (status, _) = call(&app, submit(first)).await;
    assert_eq!(status, StatusCode::OK);

    let second = json!({ "studentId": "S1", "marks": 40, "totalMarks": 50 });
    let (status, body) = call(&app, submit(second)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Student data saved!" }));

    let (status, body) = call(&app, get("/student-performance/S1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Ann");
    assert_eq!(
        strip_dates(&body["tests"]),
        vec![
            json!({ "marks": 80.0, "totalMarks": 100.0 }),
            json!({ "marks": 40.0, "totalMarks": 50.0 }),
        ]
    );
    assert!(body["tests"][0]["date"].is_string());
}

/// A record with no tests reports "no records" rather than an empty list.
#[tokio::test]
async fn test_student_without_tests() {
    let store = MemoryStore::new();
    store
        .insert(&StudentRecord::new("S7", "Kim", "PHY1"))
        .await
        .unwrap();
    let app = app(store);

    let (status, body) = call(&app, get("/student-performance/S7")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "name": "Kim", "message": "no records" }));
}

/// Attainment over the whole collection, checked at and above the threshold.
#[tokio::test]
async fn test_attainment_boundaries() {
    let app = app(MemoryStore::new());

    for (id, marks) in [("A", 60), ("B", 40)] {
        let body = json!({
            "studentId": id, "name": id, "course": "CS1", "marks": marks, "totalMarks": 100
        });
        let (status, _) = call(&app, submit(body)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = call(&app, get("/calculate-co")).await;
    assert_eq!(body, json!({ "averageMarks": 50.0, "attainmentLevel": 2 }));

    let app = self::app(MemoryStore::new());
    for (id, marks) in [("A", 60), ("B", 50)] {
        let body = json!({
            "studentId": id, "name": id, "course": "CS1", "marks": marks, "totalMarks": 100
        });
        call(&app, submit(body)).await;
    }

    let (_, body) = call(&app, get("/calculate-co")).await;
    assert_eq!(body, json!({ "averageMarks": 55.0, "attainmentLevel": 3 }));
}

/// Stored marks near the top of the f64 range still average to a number, and
/// new submissions that large are refused.
#[tokio::test]
async fn test_attainment_with_huge_marks() {
    let store = MemoryStore::new();
    for id in ["A", "B"] {
        let mut record = StudentRecord::new(id, id, "CS1");
        record.push_test(TestEntry::new(1e308, 1e308));
        store.insert(&record).await.unwrap();
    }
    let app = app(store);

    let (status, body) = call(&app, get("/calculate-co")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "averageMarks": 1e308, "attainmentLevel": 3 }));

    let huge = json!({
        "studentId": "C", "name": "C", "course": "CS1", "marks": 1e308, "totalMarks": 100
    });
    let (status, body) = call(&app, submit(huge)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "marks must be between -1000000000 and 1000000000");
}

/// Invalid submissions are rejected before the store is touched.
#[tokio::test]
async fn test_validation_precedes_persistence() {
    let store = MemoryStore::new();
    let app = app(store.clone());

    let flat = json!({ "name": "Ann", "marks": 60, "course": "CS1" });
    let (status, body) = call(&app, submit(flat)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "studentId is required" }));

    let mistyped = json!({
        "studentId": "S1", "name": "Ann", "course": "CS1", "marks": "high", "totalMarks": 100
    });
    let (status, body) = call(&app, submit(mistyped)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "marks must be a number" }));

    assert_eq!(store.operation_count(), 0);
}

/// A first submission without a name is refused and nothing is created.
#[tokio::test]
async fn test_new_student_needs_name() {
    let app = app(MemoryStore::new());

    let nameless = json!({ "studentId": "S1", "marks": 40, "totalMarks": 50 });
    let (status, body) = call(&app, submit(nameless)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "name is required" }));

    let (status, body) = call(&app, get("/student-performance/S1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "student S1 not found" }));
}

/// Unrouted paths and wrong methods still answer with an `error` body.
#[tokio::test]
async fn test_unmatched_requests_get_json_errors() {
    let app = app(MemoryStore::new());

    let (status, body) = call(&app, get("/student-performance/")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "not found" }));

    let (status, body) = call(&app, get("/add-student")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "error": "method not allowed" }));
}

/// `/students` lists every record in creation order.
#[tokio::test]
async fn test_students_listing() {
    let app = app(MemoryStore::new());

    for id in ["S2", "S1"] {
        let body = json!({
            "studentId": id, "name": "n", "course": "c", "marks": 1, "totalMarks": 2
        });
        call(&app, submit(body)).await;
    }

    let (status, body) = call(&app, get("/students")).await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["studentId"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["S2", "S1"]);
}

fn database_url() -> Option<String> {
    dotenvy::dotenv().ok();
    std::env::var("DATABASE_URL").ok()
}

async fn pg_store() -> Option<PgStore> {
    let url = database_url()?;
    let store = PgStore::connect(&url, 2, Duration::from_secs(5)).await.ok()?;
    store.migrate().await.ok()?;
    Some(store)
}

fn unique_id(prefix: &str) -> String {
    format!("{}-{}", prefix, chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

/// Insert, append, and read back through PostgreSQL.
#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_round_trip() {
    let store = match pg_store().await {
        Some(s) => s,
        None => {
            println!("Skipping: DATABASE_URL not set or unreachable");
            return;
        }
    };

    let service = StudentService::new(store.clone(), AttainmentPolicy::default());
    let id = unique_id("it");

    let first = json!({
        "studentId": id, "name": "Ann", "course": "CS1", "marks": 80, "totalMarks": 100
    });
    service.submit_payload(&first).await.unwrap();
    let second = json!({ "studentId": id, "marks": 40, "totalMarks": 50 });
    service.submit_payload(&second).await.unwrap();

    let performance = service.get_performance(&id).await.unwrap();
    assert_eq!(performance.name(), "Ann");
    let marks: Vec<f64> = performance.tests().iter().map(|t| t.marks).collect();
    assert_eq!(marks, vec![80.0, 40.0]);

    store.close().await;
}

/// The primary key rejects a second insert for the same student.
#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_duplicate_insert() {
    let store = match pg_store().await {
        Some(s) => s,
        None => {
            println!("Skipping: DATABASE_URL not set or unreachable");
            return;
        }
    };

    let record = StudentRecord::new(unique_id("dup"), "Ann", "CS1");
    store.insert(&record).await.unwrap();

    let err = store.insert(&record).await.unwrap_err();
    assert!(matches!(err, StorageError::DuplicateKey { .. }), "got {err:?}");

    let missing = StudentRecord::new(unique_id("missing"), "Nobody", "CS1");
    let err = store.update(&missing).await.unwrap_err();
    assert!(matches!(err, StorageError::MissingRecord { .. }), "got {err:?}");

    store.close().await;
}
