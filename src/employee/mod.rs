/// Employee account system
///
/// Handles login against the legacy credential format, bearer sessions,
/// and password changes.

mod manager;

pub use manager::EmployeeManager;

use serde::{Deserialize, Serialize};

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub identifier: String, // employee code or email
    pub password: String,
}

/// Session response returned on login
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub access_token: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub emp_id: String,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub first_login: bool,
}

/// Session info (for the current-session endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub emp_id: String,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub first_login: bool,
}

/// Password change request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Validated session from bearer token
#[derive(Debug, Clone)]
pub struct ValidatedSession {
    pub employee_id: i64,
    pub emp_id: String,
    pub session_id: String,
}
