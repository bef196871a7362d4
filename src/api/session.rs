/// Session endpoints: login, current session, logout, password change
use crate::{
    auth::AuthEmployee,
    context::AppContext,
    employee::{ChangePasswordRequest, LoginRequest, SessionInfo, SessionResponse},
    error::AppResult,
};
use axum::{
    extract::State,
    routing::{delete, get, post},
    Json, Router,
};

/// Build session routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/session", post(create_session))
        .route("/api/session", get(get_session))
        .route("/api/session", delete(delete_session))
        .route("/api/session/password", post(change_password))
}

/// Login endpoint
async fn create_session(
    State(ctx): State<AppContext>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<SessionResponse>> {
    let (employee, session) = ctx.employees.login(&req.identifier, &req.password).await?;

    Ok(Json(SessionResponse {
        access_token: session.access_token,
        expires_at: session.expires_at,
        emp_id: employee.emp_id,
        full_name: employee.full_name,
        email: employee.email,
        role: employee.role,
        first_login: employee.first_login,
    }))
}

/// Current session info endpoint
async fn get_session(
    State(ctx): State<AppContext>,
    auth: AuthEmployee,
) -> AppResult<Json<SessionInfo>> {
    let employee = ctx.employees.get_by_id(auth.employee_id).await?;

    Ok(Json(SessionInfo {
        emp_id: employee.emp_id,
        full_name: employee.full_name,
        email: employee.email,
        role: employee.role,
        first_login: employee.first_login,
    }))
}

/// Logout endpoint
async fn delete_session(
    State(ctx): State<AppContext>,
    auth: AuthEmployee,
) -> AppResult<Json<serde_json::Value>> {
    ctx.employees
        .delete_session(&auth.session.session_id)
        .await?;

    Ok(Json(serde_json::json!({})))
}

/// Password change endpoint
async fn change_password(
    State(ctx): State<AppContext>,
    auth: AuthEmployee,
    Json(req): Json<ChangePasswordRequest>,
) -> AppResult<Json<serde_json::Value>> {
    ctx.employees
        .change_password(auth.employee_id, &req.current_password, &req.new_password)
        .await?;

    Ok(Json(serde_json::json!({
        "message": "Password changed successfully"
    })))
}
