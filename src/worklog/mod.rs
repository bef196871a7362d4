/// Work log system
///
/// Stores the daily session logs employees submit, together with how
/// each submission was authorized by the gate.

mod manager;

pub use manager::WorkLogManager;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::worklog::WorkLog;
use crate::gate::SessionLabel;

/// Work log creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkLogRequest {
    pub project_title: String,
    pub log_heading: String,
    pub log_details: String,
    pub log_date: NaiveDate,
    pub session_type: SessionLabel,
    /// Verified approval attempt to redeem for an out-of-window submission
    pub approval_attempt_id: Option<Uuid>,
}

/// Work log as returned to the owning employee
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkLogResponse {
    pub id: i64,
    pub project_title: String,
    pub log_heading: String,
    pub log_details: String,
    pub log_date: NaiveDate,
    pub session_type: String,
    pub approval_required: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<WorkLog> for WorkLogResponse {
    fn from(log: WorkLog) -> Self {
        Self {
            id: log.id,
            project_title: log.project_title,
            log_heading: log.log_heading,
            log_details: log.log_details,
            log_date: log.log_date,
            session_type: log.session_type,
            approval_required: log.approval_required,
            created_at: log.created_at,
        }
    }
}

/// Aggregate counters for an employee's dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkLogStats {
    pub total_logs: i64,
    pub logs_this_month: i64,
    pub first_half_logs: i64,
    pub second_half_logs: i64,
    pub approval_logs: i64,
    pub distinct_projects: i64,
}
