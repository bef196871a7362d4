/// API routes and handlers
pub mod health;
pub mod logs;
pub mod middleware;
pub mod session;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(session::routes())
        .merge(logs::routes())
        .merge(health::routes())
}
