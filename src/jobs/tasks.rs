/// Background task implementations
use crate::{context::AppContext, error::AppResult};

/// Cleanup expired sessions
pub async fn cleanup_expired_sessions(ctx: &AppContext) -> AppResult<u64> {
    ctx.employees.cleanup_expired_sessions().await
}

/// Purge expired approval codes from the gate store
pub async fn purge_approval_codes(ctx: &AppContext) -> AppResult<u64> {
    Ok(ctx.gate.purge_expired() as u64)
}

/// Health check - verify all systems are operational
pub async fn health_check(ctx: &AppContext) -> AppResult<()> {
    // Check database connectivity
    sqlx::query("SELECT 1").fetch_one(&ctx.db).await?;

    // All checks passed
    Ok(())
}
