//! HTTP API handlers.

use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header::ALLOW, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{ServiceError, ValidationError};
use crate::metrics;
use crate::records::{AttainmentReport, Performance, StudentRecord, StudentService};
use crate::store::StudentStore;

/// Plain-text body served at `/`.
pub const LIVENESS_MESSAGE: &str = "Student performance service is running";

/// Confirmation returned after a recorded submission.
pub const SUBMITTED_MESSAGE: &str = "Student data saved!";

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState<S> {
    /// Record service over the configured store.
    pub service: StudentService<S>,
    /// Prometheus render handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl<S: StudentStore> AppState<S> {
    /// Create new app state without a metrics handle.
    pub fn new(service: StudentService<S>) -> Self {
        Self {
            service,
            metrics: None,
        }
    }

    /// Attach a Prometheus handle for `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Submission confirmation.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable confirmation.
    pub message: &'static str,
}

/// Liveness handler - plain text, always 200.
pub async fn root() -> &'static str {
    LIVENESS_MESSAGE
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// `POST /add-student` - validate and record a test submission.
pub async fn add_student<S: StudentStore>(
    State(state): State<AppState<S>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<MessageResponse>, ServiceError> {
    let start = Instant::now();

    let result = match payload {
        Ok(Json(body)) => state.service.submit_payload(&body).await,
        Err(rejection) => {
            metrics::inc_validation_failures("body");
            Err(ValidationError::Malformed(rejection.body_text()).into())
        }
    };

    metrics::record_http_latency(start, "add_student");
    result.map(|_| {
        Json(MessageResponse {
            message: SUBMITTED_MESSAGE,
        })
    })
}

/// `GET /student-performance/:student_id` - name and test history.
pub async fn student_performance<S: StudentStore>(
    State(state): State<AppState<S>>,
    Path(student_id): Path<String>,
) -> Result<Json<Performance>, ServiceError> {
    let start = Instant::now();
    let result = state.service.get_performance(&student_id).await;
    metrics::record_http_latency(start, "student_performance");

    result.map(Json)
}

/// `GET /students` - every stored record.
pub async fn students<S: StudentStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<StudentRecord>>, ServiceError> {
    let start = Instant::now();
    let result = state.service.list_all().await;
    metrics::record_http_latency(start, "students");

    result.map(Json)
}

/// `GET /calculate-co` - average marks and attainment level.
pub async fn calculate_co<S: StudentStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<AttainmentReport>, ServiceError> {
    let start = Instant::now();
    let result = state.service.calculate_attainment().await;
    metrics::record_http_latency(start, "calculate_co");

    result.map(Json)
}

/// `GET /metrics` - Prometheus text format, 404 when no recorder is installed.
pub async fn render_metrics<S: StudentStore>(State(state): State<AppState<S>>) -> Response {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()).into_response(),
        None => error_body(StatusCode::NOT_FOUND, "metrics recorder not installed"),
    }
}

/// Fallback for paths no route matches.
pub async fn not_found() -> Response {
    error_body(StatusCode::NOT_FOUND, "not found")
}

/// Give the empty 405 from method routing a JSON error body, keeping `Allow`.
pub async fn method_not_allowed(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let allow = response.headers().get(ALLOW).cloned();
    let mut replaced = error_body(StatusCode::METHOD_NOT_ALLOWED, "method not allowed");
    if let Some(allow) = allow {
        replaced.headers_mut().insert(ALLOW, allow);
    }
    replaced
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
