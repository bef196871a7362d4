/// Work log endpoints: window checks, approval codes, submissions
use crate::{
    auth::AuthEmployee,
    context::AppContext,
    error::{AppError, AppResult},
    gate::{SessionLabel, WindowCheck},
    worklog::{CreateWorkLogRequest, WorkLogResponse, WorkLogStats},
};
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

/// Build work log routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/logs", post(create_log))
        .route("/api/logs", get(list_logs))
        .route("/api/logs/window", get(check_window))
        .route("/api/logs/approval-code", post(request_approval_code))
        .route("/api/logs/approval-code/verify", post(verify_approval_code))
        .route("/api/logs/stats", get(log_stats))
        .route("/api/logs/projects", get(list_projects))
        .route("/api/logs/:id", get(get_log))
}

/// Window check endpoint
///
/// Tells the client whether the session is currently open for
/// submission and when its window runs.
#[derive(serde::Deserialize)]
struct WindowQuery {
    session: SessionLabel,
}

async fn check_window(
    State(ctx): State<AppContext>,
    _auth: AuthEmployee,
    Query(query): Query<WindowQuery>,
) -> AppResult<Json<WindowCheck>> {
    Ok(Json(ctx.gate.check_window(query.session)))
}

/// Request approval code endpoint
///
/// Issues a code for an out-of-window submission and mails it to the
/// configured approver. The code itself never appears in the response.
#[derive(serde::Deserialize)]
struct RequestCodeBody {
    session: SessionLabel,
}

async fn request_approval_code(
    State(ctx): State<AppContext>,
    auth: AuthEmployee,
    Json(req): Json<RequestCodeBody>,
) -> AppResult<Json<serde_json::Value>> {
    let issued = ctx.gate.request_code(auth.employee_id, req.session)?;

    // Deliver the code to the approver if mail is configured
    if ctx.mailer.is_configured() {
        let employee = ctx.employees.get_by_id(auth.employee_id).await?;
        ctx.mailer
            .send_approval_code(
                &employee.full_name,
                &employee.emp_id,
                req.session.as_str(),
                &issued.code,
                ctx.config.gate.approval_code_ttl_minutes,
            )
            .await?;
    } else {
        tracing::warn!("Email not configured, approval code generated but not sent");
    }

    Ok(Json(serde_json::json!({
        "attemptId": issued.attempt_id,
        "session": issued.session,
        "expiresAt": issued.expires_at,
        "message": "Approval code sent to the approver"
    })))
}

/// Verify approval code endpoint
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyCodeBody {
    attempt_id: Uuid,
    code: String,
}

async fn verify_approval_code(
    State(ctx): State<AppContext>,
    auth: AuthEmployee,
    Json(req): Json<VerifyCodeBody>,
) -> AppResult<Json<serde_json::Value>> {
    let code = req.code.trim();
    if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(
            "Approval code must be exactly 6 digits".to_string(),
        ));
    }

    ctx.gate.verify_code(req.attempt_id, auth.employee_id, code)?;

    Ok(Json(serde_json::json!({
        "verified": true,
        "message": "Approval code verified. You can submit your log now."
    })))
}

/// Create work log endpoint
///
/// The gate decides whether the submission goes through on the window
/// alone or must redeem a verified approval attempt.
async fn create_log(
    State(ctx): State<AppContext>,
    auth: AuthEmployee,
    Json(req): Json<CreateWorkLogRequest>,
) -> AppResult<Json<WorkLogResponse>> {
    // Field validation runs before the gate so a malformed request
    // cannot consume a verified approval attempt
    ctx.worklogs.validate_request(&req)?;

    let approval = ctx
        .gate
        .authorize(auth.employee_id, req.session_type, req.approval_attempt_id)?;
    let approved_out_of_window = approval.required;

    let log = ctx
        .worklogs
        .create_log(auth.employee_id, &req, approval)
        .await?;

    // Tell the approver their code was redeemed
    if approved_out_of_window && ctx.mailer.is_configured() {
        let employee = ctx.employees.get_by_id(auth.employee_id).await?;
        if let Err(e) = ctx
            .mailer
            .send_log_submission_notification(
                &employee.full_name,
                &employee.emp_id,
                req.session_type.as_str(),
                &log.log_date.to_string(),
                &log.log_heading,
            )
            .await
        {
            tracing::warn!("Failed to send submission notification: {}", e);
        }
    }

    Ok(Json(WorkLogResponse::from(log)))
}

/// List logs endpoint
///
/// Returns the authenticated employee's logs for one calendar month,
/// defaulting to the current month in the service timezone.
#[derive(serde::Deserialize)]
struct ListQuery {
    year: Option<i32>,
    month: Option<u32>,
}

async fn list_logs(
    State(ctx): State<AppContext>,
    auth: AuthEmployee,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<WorkLogResponse>>> {
    use chrono::Datelike;

    let today = ctx.gate.current_date();
    let year = query.year.unwrap_or_else(|| today.year());
    let month = query.month.unwrap_or_else(|| today.month());

    let logs = ctx.worklogs.list_month(auth.employee_id, year, month).await?;

    Ok(Json(logs.into_iter().map(WorkLogResponse::from).collect()))
}

/// Stats endpoint
///
/// "This month" counters default to the current month and can be
/// pointed at another one with year/month query parameters.
async fn log_stats(
    State(ctx): State<AppContext>,
    auth: AuthEmployee,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<WorkLogStats>> {
    use chrono::Datelike;

    let today = ctx.gate.current_date();
    let reference = match (query.year, query.month) {
        (None, None) => today,
        (year, month) => {
            let year = year.unwrap_or_else(|| today.year());
            let month = month.unwrap_or_else(|| today.month());
            chrono::NaiveDate::from_ymd_opt(year, month, 1)
                .ok_or_else(|| AppError::Validation("Invalid year or month".to_string()))?
        }
    };

    let stats = ctx.worklogs.stats(auth.employee_id, reference).await?;

    Ok(Json(stats))
}

/// Distinct project titles endpoint
async fn list_projects(
    State(ctx): State<AppContext>,
    auth: AuthEmployee,
) -> AppResult<Json<Vec<String>>> {
    let projects = ctx.worklogs.projects(auth.employee_id).await?;

    Ok(Json(projects))
}

/// Single log endpoint
async fn get_log(
    State(ctx): State<AppContext>,
    auth: AuthEmployee,
    Path(id): Path<i64>,
) -> AppResult<Json<WorkLogResponse>> {
    let log = ctx.worklogs.get_by_id(auth.employee_id, id).await?;

    Ok(Json(WorkLogResponse::from(log)))
}
