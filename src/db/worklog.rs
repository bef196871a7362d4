/// Work log database models
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Work log record in the database
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WorkLog {
    pub id: i64,
    pub employee_id: i64,
    pub project_title: String,
    pub log_heading: String,
    pub log_details: String,
    pub log_date: NaiveDate,
    /// "First Half" or "Second Half"
    pub session_type: String,
    /// True when the log was recorded outside the session window
    pub approval_required: bool,
    /// The consumed approval code, kept for audit
    pub approval_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
