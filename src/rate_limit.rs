/// Rate Limiting System
use crate::error::{AppError, AppResult};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorLimiter,
};
use std::{num::NonZeroU32, sync::Arc};

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests per second for authenticated employees
    pub authenticated_rps: u32,
    /// Requests per second for unauthenticated clients
    pub unauthenticated_rps: u32,
    /// Requests per minute for credential endpoints (login, code verification)
    pub sensitive_rpm: u32,
    /// Burst size
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            authenticated_rps: 100,      // 100 req/sec for authenticated
            unauthenticated_rps: 10,     // 10 req/sec for unauthenticated
            sensitive_rpm: 30,           // 30 req/min for login and code attempts
            burst_size: 50,              // Allow bursts up to 50 requests
        }
    }
}

/// Rate limiter manager
#[derive(Clone)]
pub struct RateLimiter {
    authenticated: Arc<GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    unauthenticated: Arc<GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    sensitive: Arc<GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let auth_quota = Quota::per_second(
            NonZeroU32::new(config.authenticated_rps)
                .unwrap_or(NonZeroU32::new(100).unwrap()),
        )
        .allow_burst(NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::new(50).unwrap()));

        let unauth_quota = Quota::per_second(
            NonZeroU32::new(config.unauthenticated_rps)
                .unwrap_or(NonZeroU32::new(10).unwrap()),
        )
        .allow_burst(NonZeroU32::new(config.burst_size / 5).unwrap_or(NonZeroU32::new(10).unwrap()));

        let sensitive_quota = Quota::per_minute(
            NonZeroU32::new(config.sensitive_rpm)
                .unwrap_or(NonZeroU32::new(30).unwrap()),
        )
        .allow_burst(
            NonZeroU32::new(config.burst_size / 5).unwrap_or(NonZeroU32::new(10).unwrap()),
        );

        Self {
            authenticated: Arc::new(GovernorLimiter::direct(auth_quota)),
            unauthenticated: Arc::new(GovernorLimiter::direct(unauth_quota)),
            sensitive: Arc::new(GovernorLimiter::direct(sensitive_quota)),
        }
    }

    /// Check rate limit for authenticated employee
    pub fn check_authenticated(&self) -> AppResult<()> {
        match self.authenticated.check() {
            Ok(_) => Ok(()),
            Err(_) => Err(AppError::RateLimitExceeded {
                retry_after: std::time::Duration::from_secs(1),
            }),
        }
    }

    /// Check rate limit for unauthenticated client
    pub fn check_unauthenticated(&self) -> AppResult<()> {
        match self.unauthenticated.check() {
            Ok(_) => Ok(()),
            Err(_) => Err(AppError::RateLimitExceeded {
                retry_after: std::time::Duration::from_secs(1),
            }),
        }
    }

    /// Check rate limit for credential endpoints
    pub fn check_sensitive(&self) -> AppResult<()> {
        match self.sensitive.check() {
            Ok(_) => Ok(()),
            Err(_) => Err(AppError::RateLimitExceeded {
                retry_after: std::time::Duration::from_secs(60),
            }),
        }
    }
}

/// Is this a credential endpoint that takes a guessable secret?
fn is_sensitive_path(path: &str, method: &axum::http::Method) -> bool {
    if *method != axum::http::Method::POST {
        return false;
    }
    path == "/api/session" || path == "/api/logs/approval-code/verify"
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(ctx): State<crate::context::AppContext>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let is_sensitive = is_sensitive_path(request.uri().path(), request.method());

    // Check if user is authenticated (has Authorization header)
    let has_auth_header = request
        .headers()
        .get("authorization")
        .is_some();

    // Apply appropriate rate limit based on context
    let rate_limit_result = if is_sensitive {
        // Login and code verification - tightest rate limit
        ctx.rate_limiter.check_sensitive()
    } else if has_auth_header {
        // Authenticated employees - medium rate limit
        ctx.rate_limiter.check_authenticated()
    } else {
        // Unauthenticated clients - lowest rate limit
        ctx.rate_limiter.check_unauthenticated()
    };

    match rate_limit_result {
        Ok(_) => Ok(next.run(request).await),
        Err(_) => Err(StatusCode::TOO_MANY_REQUESTS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_creation() {
        let config = RateLimitConfig::default();
        let limiter = RateLimiter::new(config);

        // Should allow first request
        assert!(limiter.check_authenticated().is_ok());
        assert!(limiter.check_unauthenticated().is_ok());
        assert!(limiter.check_sensitive().is_ok());
    }

    #[test]
    fn test_burst_limit() {
        let config = RateLimitConfig {
            authenticated_rps: 10,
            unauthenticated_rps: 5,
            sensitive_rpm: 30,
            burst_size: 5,
        };
        let limiter = RateLimiter::new(config);

        // Should allow burst requests
        for _ in 0..5 {
            assert!(limiter.check_authenticated().is_ok());
        }

        // Should hit rate limit after burst
        assert!(limiter.check_authenticated().is_err());
    }

    #[test]
    fn test_sensitive_burst_limit() {
        let config = RateLimitConfig {
            authenticated_rps: 100,
            unauthenticated_rps: 100,
            sensitive_rpm: 30,
            burst_size: 10,
        };
        let limiter = RateLimiter::new(config);

        // Sensitive bucket bursts at burst_size / 5
        for _ in 0..2 {
            assert!(limiter.check_sensitive().is_ok());
        }
        assert!(limiter.check_sensitive().is_err());
    }

    #[test]
    fn test_sensitive_path_detection() {
        use axum::http::Method;

        assert!(is_sensitive_path("/api/session", &Method::POST));
        assert!(is_sensitive_path("/api/logs/approval-code/verify", &Method::POST));
        assert!(!is_sensitive_path("/api/session", &Method::GET));
        assert!(!is_sensitive_path("/api/logs", &Method::POST));
        assert!(!is_sensitive_path("/api/logs/approval-code", &Method::POST));
    }
}
