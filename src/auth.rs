/// Authentication extractors and utilities
use crate::{
    api::middleware::extract_bearer_token,
    context::AppContext,
    employee::ValidatedSession,
    error::AppError,
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};

/// Authenticated employee - extracts and validates the session from the request
#[derive(Debug, Clone)]
pub struct AuthEmployee {
    pub employee_id: i64,
    pub emp_id: String,
    pub session: ValidatedSession,
}

#[async_trait]
impl FromRequestParts<AppContext> for AuthEmployee {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        // Extract bearer token from Authorization header
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        // Validate token
        let session = state
            .employees
            .validate_access_token(&token)
            .await?;

        let employee_id = session.employee_id;
        let emp_id = session.emp_id.clone();

        Ok(AuthEmployee {
            employee_id,
            emp_id,
            session,
        })
    }
}
