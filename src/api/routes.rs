//! HTTP API route definitions.

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    middleware::map_response,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use super::handlers::{
    add_student, calculate_co, health, method_not_allowed, not_found, render_metrics, root,
    student_performance, students, AppState,
};
use crate::store::StudentStore;

/// Build the CORS layer. `None` allows any origin.
pub fn cors_layer(origins: Option<&[String]>) -> CorsLayer {
    let allow_origin = match origins {
        None => AllowOrigin::any(),
        Some(origins) => AllowOrigin::list(origins.iter().filter_map(|o| {
            HeaderValue::from_str(o)
                .map_err(|e| warn!("Ignoring invalid CORS origin {o}: {e}"))
                .ok()
        })),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
}

/// Create the API router.
///
/// Unmatched paths and methods answer with the same `{"error": ...}` body as
/// handler errors.
pub fn create_router<S: StudentStore>(state: AppState<S>, cors: CorsLayer) -> Router {
    Router::new()
        // Liveness
        .route("/", get(root))
        .route("/health", get(health))
        // Student records
        .route("/add-student", post(add_student::<S>))
        .route("/student-performance/:student_id", get(student_performance::<S>))
        .route("/students", get(students::<S>))
        .route("/calculate-co", get(calculate_co::<S>))
        // Metrics
        .route("/metrics", get(render_metrics::<S>))
        .fallback(not_found)
        .layer(map_response(method_not_allowed))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
