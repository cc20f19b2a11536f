//! Prometheus metrics for the API server.

use std::sync::OnceLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex_lite::Regex;

use vchat_session::InteractionReport;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "vchat_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "vchat_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "vchat_http_requests_in_flight";

    // Interaction metrics
    pub const INTERACTIONS_TOTAL: &str = "vchat_interactions_total";
    pub const INTERACTIONS_FAILED_TOTAL: &str = "vchat_interactions_failed_total";
    pub const POLL_ATTEMPTS: &str = "vchat_poll_attempts";
    pub const PROCESSING_DURATION_SECONDS: &str = "vchat_processing_duration_seconds";
    pub const GENERATION_DURATION_SECONDS: &str = "vchat_generation_duration_seconds";
    pub const ASSET_DELETE_FAILURES_TOTAL: &str = "vchat_asset_delete_failures_total";

    // Session metrics
    pub const SESSIONS_ACTIVE: &str = "vchat_sessions_active";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "vchat_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a completed interaction.
pub fn record_interaction(report: &InteractionReport) {
    let labels = [("mime_type", report.mime_type.clone())];
    counter!(names::INTERACTIONS_TOTAL, &labels).increment(1);
    histogram!(names::POLL_ATTEMPTS).record(report.poll_attempts as f64);
    histogram!(names::PROCESSING_DURATION_SECONDS).record(report.processing_time.as_secs_f64());
    histogram!(names::GENERATION_DURATION_SECONDS).record(report.generation_time.as_secs_f64());

    if !report.asset_deleted {
        counter!(names::ASSET_DELETE_FAILURES_TOTAL).increment(1);
    }
}

/// Record a failed interaction by error code.
pub fn record_interaction_failed(code: &str) {
    let labels = [("code", code.to_string())];
    counter!(names::INTERACTIONS_FAILED_TOTAL, &labels).increment(1);
}

/// Update live sessions gauge.
pub fn set_active_sessions(count: usize) {
    gauge!(names::SESSIONS_ACTIVE).set(count as f64);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

fn uuid_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
            .expect("valid regex")
    })
}

fn session_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/sessions/[a-zA-Z0-9_:-]+").expect("valid regex"))
}

/// Sanitize path for metrics labels (remove IDs, etc.).
fn sanitize_path(path: &str) -> String {
    let path = uuid_re().replace_all(path, ":id");
    let path = session_re().replace_all(&path, "/sessions/:session_id");
    path.to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
