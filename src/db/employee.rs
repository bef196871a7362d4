/// Employee database models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Employee record in the database
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    /// Company employee code, e.g. "EMP1023"
    pub emp_id: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
    /// Credential in the legacy PBKDF2 format carried over from the
    /// previous HR system
    pub password_hash: String,
    pub is_active: bool,
    /// Set until the employee replaces the provisioned password
    pub first_login: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Session record in the database
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EmployeeSession {
    pub id: String,
    pub employee_id: i64,
    pub access_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
