/// Application context and dependency injection
use crate::{
    config::ServerConfig,
    db,
    employee::EmployeeManager,
    error::{AppError, AppResult},
    gate::SubmissionGate,
    mailer::Mailer,
    rate_limit::{RateLimitConfig, RateLimiter},
    worklog::WorkLogManager,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Instant;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub employees: Arc<EmployeeManager>,
    pub worklogs: Arc<WorkLogManager>,
    // Submission gate: window math and approval codes
    pub gate: Arc<SubmissionGate>,
    // Rate limiter
    pub rate_limiter: Arc<RateLimiter>,
    // Email mailer
    pub mailer: Arc<Mailer>,
    // Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> AppResult<Self> {
        // Validate configuration
        config.validate()?;

        // Create data directories if they don't exist
        Self::ensure_directories(&config).await?;

        // Initialize database
        let db = db::create_pool(&config.storage.database, db::DatabaseOptions::default()).await?;

        // Run migrations
        db::run_migrations(&db).await?;

        // Test connection
        db::test_connection(&db).await?;

        let config = Arc::new(config);

        // Initialize employee manager
        let employees = Arc::new(EmployeeManager::new(db.clone(), Arc::clone(&config)));

        // Initialize work log manager
        let worklogs = Arc::new(WorkLogManager::new(db.clone()));

        // Initialize submission gate
        let gate = Arc::new(SubmissionGate::new(&config.gate));

        // Initialize rate limiter
        let rate_limiter = Arc::new(RateLimiter::new(RateLimitConfig::default()));

        // Initialize mailer
        let mailer = Arc::new(Mailer::new(config.email.clone())?);

        Ok(Self {
            config,
            db,
            employees,
            worklogs,
            gate,
            rate_limiter,
            mailer,
            started_at: Instant::now(),
        })
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &ServerConfig) -> AppResult<()> {
        let mut dirs = vec![config.storage.data_directory.clone()];
        if let Some(parent) = config.storage.database.parent() {
            dirs.push(parent.to_path_buf());
        }

        for dir in dirs {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                tokio::fs::create_dir_all(&dir).await.map_err(|e| {
                    AppError::Internal(format!("Failed to create directory {:?}: {}", dir, e))
                })?;
            }
        }

        Ok(())
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }

    /// Seconds since the context was created
    pub fn uptime_seconds(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}
