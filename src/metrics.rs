//! Prometheus metrics for submissions, failures, and latency.
//!
//! This module provides:
//! - Submission and record creation counters
//! - Validation and storage failure counters
//! - HTTP request latency by endpoint
//! - Store operation latency by operation

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// Store operation latency metric name.
pub const METRIC_STORE_OPERATION_LATENCY: &str = "store_operation_latency_ms";
/// Tests submitted counter metric name.
pub const METRIC_TESTS_SUBMITTED: &str = "tests_submitted_total";
/// Students created counter metric name.
pub const METRIC_STUDENTS_CREATED: &str = "students_created_total";
/// Validation failures counter metric name.
pub const METRIC_VALIDATION_FAILURES: &str = "validation_failures_total";
/// Storage errors counter metric name.
pub const METRIC_STORAGE_ERRORS: &str = "storage_errors_total";

/// Initialize all metric descriptions.
/// Call this once at startup, after installing a recorder.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );
    describe_histogram!(
        METRIC_STORE_OPERATION_LATENCY,
        "Store operation latency in milliseconds"
    );

    describe_counter!(METRIC_TESTS_SUBMITTED, "Total number of test entries recorded");
    describe_counter!(METRIC_STUDENTS_CREATED, "Total number of student records created");
    describe_counter!(
        METRIC_VALIDATION_FAILURES,
        "Total number of submissions rejected by validation"
    );
    describe_counter!(METRIC_STORAGE_ERRORS, "Total number of storage failures");

    debug!("Metrics initialized");
}

/// Install the global Prometheus recorder and return its render handle.
pub fn install_prometheus() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, endpoint: &'static str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "endpoint" => endpoint).record(latency_ms);
}

/// Increment tests submitted counter.
pub fn inc_tests_submitted() {
    counter!(METRIC_TESTS_SUBMITTED).increment(1);
}

/// Increment students created counter.
pub fn inc_students_created() {
    counter!(METRIC_STUDENTS_CREATED).increment(1);
}

/// Increment validation failures counter.
pub fn inc_validation_failures(field: &'static str) {
    counter!(METRIC_VALIDATION_FAILURES, "field" => field).increment(1);
}

/// Increment storage errors counter.
pub fn inc_storage_errors() {
    counter!(METRIC_STORAGE_ERRORS).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
    operation: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric and operation label.
    pub fn new(metric_name: &'static str, operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
            operation,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        let latency_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        histogram!(self.metric_name, "operation" => self.operation).record(latency_ms);
    }
}

/// Create a latency timer for a store operation.
pub fn timer_store_operation(operation: &'static str) -> LatencyTimer {
    LatencyTimer::new(METRIC_STORE_OPERATION_LATENCY, operation)
}
