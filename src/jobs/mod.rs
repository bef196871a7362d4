use crate::metrics;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{interval, Duration};
use tracing::{error, info};

pub mod tasks;

/// Job scheduler for background tasks
pub struct JobScheduler {
    context: Arc<crate::context::AppContext>,
}

impl JobScheduler {
    pub fn new(context: Arc<crate::context::AppContext>) -> Self {
        Self { context }
    }

    /// Start all background jobs
    pub fn start(self: Arc<Self>) {
        info!("Starting background job scheduler");

        // Spawn cleanup tasks
        tokio::spawn(Self::approval_code_purge_job(Arc::clone(&self)));
        tokio::spawn(Self::expired_session_cleanup_job(Arc::clone(&self)));

        // Spawn monitoring tasks
        tokio::spawn(Self::health_check_job(Arc::clone(&self)));

        info!("Background jobs started");
    }

    /// Purge expired approval codes (runs every minute)
    async fn approval_code_purge_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(60)); // Every minute

        loop {
            interval.tick().await;

            let start = Instant::now();
            match tasks::purge_approval_codes(&scheduler.context).await {
                Ok(count) => {
                    metrics::record_background_job(
                        "approval_code_purge",
                        "success",
                        start.elapsed().as_secs_f64(),
                    );
                    if count > 0 {
                        info!("Purged {} expired approval codes", count);
                    }
                }
                Err(e) => {
                    metrics::record_background_job(
                        "approval_code_purge",
                        "failure",
                        start.elapsed().as_secs_f64(),
                    );
                    error!("Failed to purge approval codes: {}", e);
                }
            }
        }
    }

    /// Cleanup expired sessions (runs every hour)
    async fn expired_session_cleanup_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(3600)); // Every hour

        loop {
            interval.tick().await;
            info!("Running expired session cleanup");

            let start = Instant::now();
            match tasks::cleanup_expired_sessions(&scheduler.context).await {
                Ok(count) => {
                    metrics::record_background_job(
                        "session_cleanup",
                        "success",
                        start.elapsed().as_secs_f64(),
                    );
                    if count > 0 {
                        info!("Cleaned up {} expired sessions", count);
                    } else {
                        info!("Session cleanup: no expired sessions found");
                    }
                }
                Err(e) => {
                    metrics::record_background_job(
                        "session_cleanup",
                        "failure",
                        start.elapsed().as_secs_f64(),
                    );
                    error!("Failed to cleanup expired sessions: {}", e);
                }
            }
        }
    }

    /// Health check job (runs every 5 minutes)
    async fn health_check_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(300)); // Every 5 minutes

        loop {
            interval.tick().await;

            let start = Instant::now();
            match tasks::health_check(&scheduler.context).await {
                Ok(_) => {
                    // Silent success - health is good
                    metrics::record_background_job(
                        "health_check",
                        "success",
                        start.elapsed().as_secs_f64(),
                    );
                }
                Err(e) => {
                    metrics::record_background_job(
                        "health_check",
                        "failure",
                        start.elapsed().as_secs_f64(),
                    );
                    error!("Health check failed: {}", e);
                }
            }
        }
    }
}
