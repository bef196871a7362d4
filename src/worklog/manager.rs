/// Work log manager implementation using runtime queries
/// Queries are built at runtime to avoid needing DATABASE_URL during
/// compilation

use crate::{
    db::worklog::WorkLog,
    error::{AppError, AppResult},
    gate::{Approval, SessionLabel},
    worklog::{CreateWorkLogRequest, WorkLogStats},
};
use chrono::{Datelike, NaiveDate, Utc};
use sqlx::{Row, SqlitePool};

const TITLE_MAX_LEN: usize = 200;
const DETAILS_MAX_LEN: usize = 5000;

/// Work log manager service
pub struct WorkLogManager {
    db: SqlitePool,
}

impl WorkLogManager {
    /// Create a new work log manager
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Check the request's text fields. Called before the gate runs so
    /// a rejected request cannot burn a verified approval attempt.
    pub fn validate_request(&self, request: &CreateWorkLogRequest) -> AppResult<()> {
        let project_title = request.project_title.trim();
        let log_heading = request.log_heading.trim();
        let log_details = request.log_details.trim();

        if project_title.is_empty() {
            return Err(AppError::Validation("Project title is required".to_string()));
        }
        if project_title.len() > TITLE_MAX_LEN {
            return Err(AppError::Validation(format!(
                "Project title must be at most {} characters",
                TITLE_MAX_LEN
            )));
        }
        if log_heading.is_empty() {
            return Err(AppError::Validation("Log heading is required".to_string()));
        }
        if log_heading.len() > TITLE_MAX_LEN {
            return Err(AppError::Validation(format!(
                "Log heading must be at most {} characters",
                TITLE_MAX_LEN
            )));
        }
        if log_details.is_empty() {
            return Err(AppError::Validation("Log details are required".to_string()));
        }
        if log_details.len() > DETAILS_MAX_LEN {
            return Err(AppError::Validation(format!(
                "Log details must be at most {} characters",
                DETAILS_MAX_LEN
            )));
        }

        Ok(())
    }

    /// Record a work log. The submission has already passed the gate;
    /// the approval outcome is persisted with the log for audit.
    pub async fn create_log(
        &self,
        employee_id: i64,
        request: &CreateWorkLogRequest,
        approval: Approval,
    ) -> AppResult<WorkLog> {
        self.validate_request(request)?;

        let project_title = request.project_title.trim();
        let log_heading = request.log_heading.trim();
        let log_details = request.log_details.trim();

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO work_log (employee_id, project_title, log_heading, log_details,
                                   log_date, session_type, approval_required, approval_code,
                                   created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(employee_id)
        .bind(project_title)
        .bind(log_heading)
        .bind(log_details)
        .bind(request.log_date)
        .bind(request.session_type.as_str())
        .bind(approval.required)
        .bind(&approval.code)
        .bind(now)
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(|e| AppError::Database(e))?;

        let id = result.last_insert_rowid();
        crate::metrics::record_work_log_created(request.session_type.as_str());
        tracing::info!(
            employee_id,
            log_id = id,
            session = %request.session_type,
            approval_required = approval.required,
            "Work log recorded"
        );

        Ok(WorkLog {
            id,
            employee_id,
            project_title: project_title.to_string(),
            log_heading: log_heading.to_string(),
            log_details: log_details.to_string(),
            log_date: request.log_date,
            session_type: request.session_type.as_str().to_string(),
            approval_required: approval.required,
            approval_code: approval.code,
            created_at: now,
            updated_at: now,
        })
    }

    /// List an employee's logs for one calendar month, newest first
    pub async fn list_month(
        &self,
        employee_id: i64,
        year: i32,
        month: u32,
    ) -> AppResult<Vec<WorkLog>> {
        let (start, end) = month_bounds(year, month)?;

        let rows = sqlx::query(
            "SELECT id, employee_id, project_title, log_heading, log_details, log_date,
                    session_type, approval_required, approval_code, created_at, updated_at
             FROM work_log
             WHERE employee_id = ?1 AND log_date >= ?2 AND log_date < ?3
             ORDER BY log_date DESC, created_at DESC",
        )
        .bind(employee_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await
        .map_err(|e| AppError::Database(e))?;

        Ok(rows
            .into_iter()
            .map(|row| WorkLog {
                id: row.get("id"),
                employee_id: row.get("employee_id"),
                project_title: row.get("project_title"),
                log_heading: row.get("log_heading"),
                log_details: row.get("log_details"),
                log_date: row.get("log_date"),
                session_type: row.get("session_type"),
                approval_required: row.get("approval_required"),
                approval_code: row.get("approval_code"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            })
            .collect())
    }

    /// Aggregate counters for the employee's dashboard. "This month"
    /// is relative to the supplied date, which the caller takes from
    /// the service clock.
    pub async fn stats(&self, employee_id: i64, today: NaiveDate) -> AppResult<WorkLogStats> {
        let (month_start, month_end) = month_bounds(today.year(), today.month())?;

        let row = sqlx::query(
            "SELECT COUNT(*) AS total,
                    COALESCE(SUM(CASE WHEN log_date >= ?2 AND log_date < ?3 THEN 1 ELSE 0 END), 0) AS this_month,
                    COALESCE(SUM(CASE WHEN session_type = ?4 THEN 1 ELSE 0 END), 0) AS first_half,
                    COALESCE(SUM(CASE WHEN session_type = ?5 THEN 1 ELSE 0 END), 0) AS second_half,
                    COALESCE(SUM(CASE WHEN approval_required = 1 THEN 1 ELSE 0 END), 0) AS approval,
                    COUNT(DISTINCT project_title) AS projects
             FROM work_log WHERE employee_id = ?1",
        )
        .bind(employee_id)
        .bind(month_start)
        .bind(month_end)
        .bind(SessionLabel::FirstHalf.as_str())
        .bind(SessionLabel::SecondHalf.as_str())
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::Database(e))?;

        Ok(WorkLogStats {
            total_logs: row.get("total"),
            logs_this_month: row.get("this_month"),
            first_half_logs: row.get("first_half"),
            second_half_logs: row.get("second_half"),
            approval_logs: row.get("approval"),
            distinct_projects: row.get("projects"),
        })
    }

    /// Distinct project titles the employee has logged against
    pub async fn projects(&self, employee_id: i64) -> AppResult<Vec<String>> {
        let rows = sqlx::query(
            "SELECT DISTINCT project_title FROM work_log
             WHERE employee_id = ?1 ORDER BY project_title",
        )
        .bind(employee_id)
        .fetch_all(&self.db)
        .await
        .map_err(|e| AppError::Database(e))?;

        Ok(rows
            .into_iter()
            .map(|row| row.get("project_title"))
            .collect())
    }

    /// Fetch one log, scoped to its owner
    pub async fn get_by_id(&self, employee_id: i64, log_id: i64) -> AppResult<WorkLog> {
        let row = sqlx::query(
            "SELECT id, employee_id, project_title, log_heading, log_details, log_date,
                    session_type, approval_required, approval_code, created_at, updated_at
             FROM work_log WHERE id = ?1 AND employee_id = ?2",
        )
        .bind(log_id)
        .bind(employee_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| AppError::Database(e))?
        .ok_or_else(|| AppError::NotFound("Work log not found".to_string()))?;

        Ok(WorkLog {
            id: row.get("id"),
            employee_id: row.get("employee_id"),
            project_title: row.get("project_title"),
            log_heading: row.get("log_heading"),
            log_details: row.get("log_details"),
            log_date: row.get("log_date"),
            session_type: row.get("session_type"),
            approval_required: row.get("approval_required"),
            approval_code: row.get("approval_code"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

/// First day of the month and first day of the following month
fn month_bounds(year: i32, month: u32) -> AppResult<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::Validation(format!("Invalid month {}-{}", year, month)))?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| AppError::Validation(format!("Invalid month {}-{}", year, month)))?;

    Ok((start, end))
}
