/// Submission gate module for work-log timing rules
///
/// Work logs may only be recorded during one of the two daily session
/// windows. Outside a window, an employee needs a single-use approval
/// code that is issued on request, delivered out of band, and verified
/// before the log is accepted. This module owns the window math, the
/// gate state machine, and the approval code lifecycle.
use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::GateConfig;

pub mod clock;
pub mod codes;

pub use clock::{Clock, SystemClock};
pub use codes::CodeStore;

/// The two session halves a work log can be recorded against.
/// Serialized with the exact labels the previous HR system stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionLabel {
    #[serde(rename = "First Half")]
    FirstHalf,
    #[serde(rename = "Second Half")]
    SecondHalf,
}

impl SessionLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionLabel::FirstHalf => "First Half",
            SessionLabel::SecondHalf => "Second Half",
        }
    }
}

impl std::fmt::Display for SessionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A daily submission window. Both bounds are inclusive: a log at
/// exactly the start or end minute is still in time.
#[derive(Debug, Clone, Copy)]
pub struct Window {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Window {
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time <= self.end
    }

    pub fn range_label(&self) -> String {
        format!(
            "{} to {}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// The configured windows for both session halves
#[derive(Debug, Clone, Copy)]
pub struct SessionWindows {
    first_half: Window,
    second_half: Window,
}

impl SessionWindows {
    pub fn from_config(config: &GateConfig) -> Self {
        Self {
            first_half: Window {
                start: config.first_half_start,
                end: config.first_half_end,
            },
            second_half: Window {
                start: config.second_half_start,
                end: config.second_half_end,
            },
        }
    }

    pub fn window_for(&self, session: SessionLabel) -> Window {
        match session {
            SessionLabel::FirstHalf => self.first_half,
            SessionLabel::SecondHalf => self.second_half,
        }
    }
}

/// Where a submission attempt stands in the gate state machine.
/// WithinWindow and CodeVerified are the only states that allow a log
/// to be recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// No window comparison has happened yet
    Unchecked,
    /// Current time falls inside the session window
    WithinWindow,
    /// Current time falls outside the session window
    OutsideWindow,
    /// An approval code has been issued and awaits verification
    CodeRequested,
    /// The approval code matched and was consumed
    CodeVerified,
    /// The last candidate did not match; the code is still live
    CodeRejected,
}

impl GateState {
    pub fn allows_submission(&self) -> bool {
        matches!(self, GateState::WithinWindow | GateState::CodeVerified)
    }
}

/// Gate failures, each mapped to an HTTP status and stable error code
#[derive(Debug, Error)]
pub enum GateError {
    #[error(
        "log submission for the {session} session is outside the allowed window ({}; current time {})",
        window.range_label(),
        now.format("%H:%M:%S")
    )]
    WindowDenied {
        session: SessionLabel,
        window: Window,
        now: NaiveTime,
    },

    #[error("invalid gate transition: {0}")]
    InvalidTransition(String),

    #[error("approval code does not match")]
    CodeMismatch,

    #[error("no approval code pending for this attempt")]
    NoCodePending,

    #[error("approval code has expired")]
    CodeExpired,
}

impl GateError {
    pub fn http_code(&self) -> (StatusCode, &'static str) {
        match self {
            GateError::WindowDenied { .. } => (StatusCode::FORBIDDEN, "ApprovalRequired"),
            GateError::InvalidTransition(_) => (StatusCode::BAD_REQUEST, "InvalidTransition"),
            GateError::CodeMismatch => (StatusCode::BAD_REQUEST, "CodeMismatch"),
            GateError::NoCodePending => (StatusCode::BAD_REQUEST, "NoCodePending"),
            GateError::CodeExpired => (StatusCode::BAD_REQUEST, "CodeExpired"),
        }
    }
}

/// Result of asking whether a session is currently open for submission
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowCheck {
    pub session: SessionLabel,
    pub within_window: bool,
    pub window_start: String,
    pub window_end: String,
    pub current_time: String,
    pub requires_approval: bool,
}

/// A freshly issued approval code. The code itself is delivered to the
/// approver by mail; only the attempt id and expiry go back to the
/// requesting employee.
#[derive(Debug, Clone)]
pub struct IssuedCode {
    pub attempt_id: Uuid,
    pub code: String,
    pub session: SessionLabel,
    pub expires_at: chrono::DateTime<chrono::FixedOffset>,
}

/// How a permitted submission was authorized, recorded alongside the log
#[derive(Debug, Clone)]
pub struct Approval {
    pub required: bool,
    pub code: Option<String>,
}

/// The submission gate itself: window math plus the approval code store
pub struct SubmissionGate {
    windows: SessionWindows,
    store: CodeStore,
    clock: Arc<dyn Clock>,
    code_ttl: Duration,
}

impl SubmissionGate {
    pub fn new(config: &GateConfig) -> Self {
        Self::with_clock(
            config,
            Arc::new(SystemClock::new(config.timezone_offset_minutes)),
        )
    }

    pub fn with_clock(config: &GateConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: SessionWindows::from_config(config),
            store: CodeStore::new(),
            clock,
            code_ttl: Duration::minutes(config.approval_code_ttl_minutes),
        }
    }

    /// Compare the current time against the session's window
    pub fn evaluate(&self, session: SessionLabel) -> GateState {
        let window = self.windows.window_for(session);
        if window.contains(self.clock.now().time()) {
            GateState::WithinWindow
        } else {
            GateState::OutsideWindow
        }
    }

    /// Describe the session's window and whether submission is open now
    pub fn check_window(&self, session: SessionLabel) -> WindowCheck {
        let window = self.windows.window_for(session);
        let now = self.clock.now().time();
        let within = window.contains(now);
        crate::metrics::record_window_check(session.as_str(), within);

        WindowCheck {
            session,
            within_window: within,
            window_start: window.start.format("%H:%M").to_string(),
            window_end: window.end.format("%H:%M").to_string(),
            current_time: now.format("%H:%M:%S").to_string(),
            requires_approval: !within,
        }
    }

    /// Issue an approval code for an out-of-window submission. Inside
    /// the window there is nothing to approve, so the request is
    /// rejected as an invalid transition.
    pub fn request_code(
        &self,
        employee_id: i64,
        session: SessionLabel,
    ) -> Result<IssuedCode, GateError> {
        if self.evaluate(session) == GateState::WithinWindow {
            return Err(GateError::InvalidTransition(
                "submission window is open, no approval code needed".to_string(),
            ));
        }

        let now = self.clock.now();
        let code = codes::generate_approval_code();
        let attempt = self
            .store
            .insert(employee_id, session, code, now, self.code_ttl);
        crate::metrics::record_code_issued(session.as_str());

        Ok(IssuedCode {
            attempt_id: attempt.id,
            code: attempt.code,
            session,
            expires_at: attempt.expires_at,
        })
    }

    /// Check a candidate code. On match the code is consumed; on
    /// mismatch it stays live so the employee can retype it.
    pub fn verify_code(
        &self,
        attempt_id: Uuid,
        employee_id: i64,
        candidate: &str,
    ) -> Result<(), GateError> {
        let result = self
            .store
            .verify_and_consume(attempt_id, employee_id, candidate, self.clock.now());

        match &result {
            Ok(()) => crate::metrics::record_code_verification("verified"),
            Err(GateError::CodeMismatch) => crate::metrics::record_code_verification("mismatch"),
            Err(GateError::CodeExpired) => crate::metrics::record_code_verification("expired"),
            Err(_) => crate::metrics::record_code_verification("invalid"),
        }

        result
    }

    /// Decide whether a log submission may proceed. Inside the window
    /// no approval is involved. Outside it, the submission must redeem
    /// a verified attempt; anything else is denied with the window
    /// details so the client can show when submission reopens.
    pub fn authorize(
        &self,
        employee_id: i64,
        session: SessionLabel,
        attempt_id: Option<Uuid>,
    ) -> Result<Approval, GateError> {
        let window = self.windows.window_for(session);
        let now = self.clock.now();

        if window.contains(now.time()) {
            crate::metrics::record_submission_decision("window");
            return Ok(Approval {
                required: false,
                code: None,
            });
        }

        let redeemed = attempt_id
            .and_then(|id| self.store.take_verified(id, employee_id, session).ok());

        match redeemed {
            Some(attempt) => {
                crate::metrics::record_submission_decision("approval_code");
                Ok(Approval {
                    required: true,
                    code: Some(attempt.code),
                })
            }
            None => {
                crate::metrics::record_submission_decision("denied");
                Err(GateError::WindowDenied {
                    session,
                    window,
                    now: now.time(),
                })
            }
        }
    }

    /// Today's date in the service timezone
    pub fn current_date(&self) -> chrono::NaiveDate {
        self.clock.now().date_naive()
    }

    /// Sweep expired attempts out of the store
    pub fn purge_expired(&self) -> usize {
        self.store.purge_expired(self.clock.now())
    }
}
