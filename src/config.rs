/// Configuration management for ShiftLog
use crate::error::{AppError, AppResult};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub authentication: AuthConfig,
    pub gate: GateConfig,
    pub email: Option<EmailConfig>,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: PathBuf,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Session lifetime in hours
    pub session_ttl_hours: i64,
    /// PBKDF2 iteration count for newly stored credentials
    pub password_iterations: u32,
}

/// Submission gate configuration
///
/// Both session windows are daily time-of-day ranges evaluated in a fixed
/// timezone. Bounds are inclusive on both ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Offset from UTC in minutes (default +330, i.e. UTC+05:30)
    pub timezone_offset_minutes: i32,
    pub first_half_start: NaiveTime,
    pub first_half_end: NaiveTime,
    pub second_half_start: NaiveTime,
    pub second_half_end: NaiveTime,
    /// Approval codes expire after this many minutes
    pub approval_code_ttl_minutes: i64,
}

/// Email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_url: String,
    pub from_address: String,
    /// Recipient of approval-code requests
    pub approver_address: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("SHIFTLOG_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("SHIFTLOG_PORT")
            .unwrap_or_else(|_| "8090".to_string())
            .parse()
            .map_err(|_| AppError::Validation("Invalid port number".to_string()))?;
        let version = env::var("SHIFTLOG_VERSION").unwrap_or_else(|_| "0.1.0".to_string());

        let data_directory: PathBuf = env::var("SHIFTLOG_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let database = env::var("SHIFTLOG_DATABASE_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("shiftlog.sqlite"));

        let jwt_secret = env::var("SHIFTLOG_JWT_SECRET")
            .map_err(|_| AppError::Validation("JWT secret required".to_string()))?;
        let session_ttl_hours = env::var("SHIFTLOG_SESSION_TTL_HOURS")
            .unwrap_or_else(|_| "12".to_string())
            .parse()
            .unwrap_or(12);
        let password_iterations = env::var("SHIFTLOG_PASSWORD_ITERATIONS")
            .unwrap_or_else(|_| "720000".to_string())
            .parse()
            .unwrap_or(720_000);

        let timezone_offset_minutes = env::var("SHIFTLOG_TIMEZONE_OFFSET_MINUTES")
            .unwrap_or_else(|_| "330".to_string())
            .parse()
            .unwrap_or(330);
        let first_half_start = parse_window_time("SHIFTLOG_FIRST_HALF_START", "13:00")?;
        let first_half_end = parse_window_time("SHIFTLOG_FIRST_HALF_END", "14:30")?;
        let second_half_start = parse_window_time("SHIFTLOG_SECOND_HALF_START", "18:00")?;
        let second_half_end = parse_window_time("SHIFTLOG_SECOND_HALF_END", "19:30")?;
        let approval_code_ttl_minutes = env::var("SHIFTLOG_APPROVAL_CODE_TTL_MINUTES")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .unwrap_or(15);

        let email = if let Ok(smtp_url) = env::var("SHIFTLOG_EMAIL_SMTP_URL") {
            Some(EmailConfig {
                smtp_url,
                from_address: env::var("SHIFTLOG_EMAIL_FROM_ADDRESS")
                    .unwrap_or_else(|_| format!("noreply@{}", hostname)),
                approver_address: env::var("SHIFTLOG_APPROVER_EMAIL")
                    .map_err(|_| AppError::Validation("Approver email required".to_string()))?,
            })
        } else {
            None
        };

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                version,
            },
            storage: StorageConfig {
                data_directory,
                database,
            },
            authentication: AuthConfig {
                jwt_secret,
                session_ttl_hours,
                password_iterations,
            },
            gate: GateConfig {
                timezone_offset_minutes,
                first_half_start,
                first_half_end,
                second_half_start,
                second_half_end,
                approval_code_ttl_minutes,
            },
            email,
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.service.hostname.is_empty() {
            return Err(AppError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.authentication.jwt_secret.len() < 32 {
            return Err(AppError::Validation(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }

        if self.authentication.password_iterations == 0 {
            return Err(AppError::Validation(
                "Password iteration count must be positive".to_string(),
            ));
        }

        if self.gate.timezone_offset_minutes.abs() >= 24 * 60 {
            return Err(AppError::Validation(
                "Timezone offset must be less than a day".to_string(),
            ));
        }

        if self.gate.first_half_start >= self.gate.first_half_end
            || self.gate.second_half_start >= self.gate.second_half_end
        {
            return Err(AppError::Validation(
                "Session window start must precede its end".to_string(),
            ));
        }

        if self.gate.approval_code_ttl_minutes <= 0 {
            return Err(AppError::Validation(
                "Approval code TTL must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parse a HH:MM window bound from the environment
fn parse_window_time(var: &str, default: &str) -> AppResult<NaiveTime> {
    let raw = env::var(var).unwrap_or_else(|_| default.to_string());
    NaiveTime::parse_from_str(&raw, "%H:%M")
        .map_err(|_| AppError::Validation(format!("{} must be HH:MM, got '{}'", var, raw)))
}
