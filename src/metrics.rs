/// Metrics and telemetry for ShiftLog
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - HTTP request counts and latencies
/// - Login outcomes and active sessions
/// - Submission gate decisions and approval code lifecycle
/// - Background job execution

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, Encoder, HistogramVec,
    IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // ========== HTTP Metrics ==========

    /// Total HTTP requests by method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latencies in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    /// Active HTTP requests
    pub static ref HTTP_REQUESTS_ACTIVE: IntGauge = register_int_gauge!(
        "http_requests_active",
        "Number of HTTP requests currently being processed"
    )
    .unwrap();

    // ========== Authentication Metrics ==========

    /// Login attempts by outcome
    pub static ref LOGIN_ATTEMPTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "login_attempts_total",
        "Total number of login attempts",
        &["outcome"]
    )
    .unwrap();

    /// Active employee sessions
    pub static ref SESSIONS_ACTIVE: IntGauge = register_int_gauge!(
        "sessions_active",
        "Number of active employee sessions"
    )
    .unwrap();

    // ========== Submission Gate Metrics ==========

    /// Window checks by session and result
    pub static ref WINDOW_CHECKS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "window_checks_total",
        "Total number of submission window checks",
        &["session", "result"]
    )
    .unwrap();

    /// Approval codes issued by session
    pub static ref APPROVAL_CODES_ISSUED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "approval_codes_issued_total",
        "Total number of approval codes issued",
        &["session"]
    )
    .unwrap();

    /// Approval code verification attempts by outcome
    pub static ref APPROVAL_CODE_VERIFICATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "approval_code_verifications_total",
        "Total number of approval code verification attempts",
        &["outcome"]
    )
    .unwrap();

    /// Log submission gate decisions
    pub static ref LOG_SUBMISSION_DECISIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "log_submission_decisions_total",
        "Total number of log submission gate decisions",
        &["decision"]
    )
    .unwrap();

    // ========== Work Log Metrics ==========

    /// Work logs created by session
    pub static ref WORK_LOGS_CREATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "work_logs_created_total",
        "Total number of work logs created",
        &["session"]
    )
    .unwrap();

    // ========== Background Job Metrics ==========

    /// Background job executions by job type and status
    pub static ref BACKGROUND_JOBS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "background_jobs_total",
        "Total number of background job executions",
        &["job_type", "status"]
    )
    .unwrap();

    /// Background job duration in seconds
    pub static ref BACKGROUND_JOB_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "background_job_duration_seconds",
        "Background job execution time in seconds",
        &["job_type"],
        vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]
    )
    .unwrap();

    // ========== Error Metrics ==========

    /// Errors by error type
    pub static ref ERRORS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "errors_total",
        "Total number of errors",
        &["error_type", "module"]
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration);
}

/// Record a login attempt
pub fn record_login(success: bool) {
    LOGIN_ATTEMPTS_TOTAL
        .with_label_values(&[if success { "success" } else { "failure" }])
        .inc();
}

/// Update the active session gauge
pub fn set_active_sessions(count: i64) {
    SESSIONS_ACTIVE.set(count);
}

/// Record a submission window check
pub fn record_window_check(session: &str, within: bool) {
    WINDOW_CHECKS_TOTAL
        .with_label_values(&[session, if within { "within" } else { "outside" }])
        .inc();
}

/// Record an issued approval code
pub fn record_code_issued(session: &str) {
    APPROVAL_CODES_ISSUED_TOTAL
        .with_label_values(&[session])
        .inc();
}

/// Record an approval code verification attempt
pub fn record_code_verification(outcome: &str) {
    APPROVAL_CODE_VERIFICATIONS_TOTAL
        .with_label_values(&[outcome])
        .inc();
}

/// Record a log submission gate decision
pub fn record_submission_decision(decision: &str) {
    LOG_SUBMISSION_DECISIONS_TOTAL
        .with_label_values(&[decision])
        .inc();
}

/// Record a created work log
pub fn record_work_log_created(session: &str) {
    WORK_LOGS_CREATED_TOTAL.with_label_values(&[session]).inc();
}

/// Record a background job execution
pub fn record_background_job(job_type: &str, status: &str, duration: f64) {
    BACKGROUND_JOBS_TOTAL
        .with_label_values(&[job_type, status])
        .inc();
    BACKGROUND_JOB_DURATION_SECONDS
        .with_label_values(&[job_type])
        .observe(duration);
}

/// Record an error
pub fn record_error(error_type: &str, module: &str) {
    ERRORS_TOTAL
        .with_label_values(&[error_type, module])
        .inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_http_request() {
        record_http_request("GET", "/api/logs", 200, 0.05);
        let metrics = render_metrics();
        assert!(metrics.contains("http_requests_total"));
        assert!(metrics.contains("http_request_duration_seconds"));
    }

    #[test]
    fn test_record_login_outcomes() {
        record_login(true);
        record_login(false);
        let metrics = render_metrics();
        assert!(metrics.contains("login_attempts_total"));
        assert!(metrics.contains("outcome=\"success\""));
        assert!(metrics.contains("outcome=\"failure\""));
    }

    #[test]
    fn test_record_gate_activity() {
        record_window_check("First Half", true);
        record_window_check("First Half", false);
        record_code_issued("First Half");
        record_code_verification("verified");
        record_submission_decision("approval_code");
        let metrics = render_metrics();
        assert!(metrics.contains("window_checks_total"));
        assert!(metrics.contains("approval_codes_issued_total"));
        assert!(metrics.contains("approval_code_verifications_total"));
        assert!(metrics.contains("log_submission_decisions_total"));
    }

    #[test]
    fn test_record_background_job() {
        record_background_job("purge_approval_codes", "success", 0.2);
        let metrics = render_metrics();
        assert!(metrics.contains("background_jobs_total"));
        assert!(metrics.contains("background_job_duration_seconds"));
    }

    #[test]
    fn test_metrics_rendering() {
        // Record some metrics first to ensure output
        record_http_request("GET", "/health", 200, 0.01);
        record_work_log_created("Second Half");

        let metrics = render_metrics();

        assert!(metrics.contains("# HELP"));
        assert!(metrics.contains("# TYPE"));
        assert!(metrics.contains("work_logs_created_total"));
    }
}
