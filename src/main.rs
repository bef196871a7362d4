/// ShiftLog - Employee attendance and work-log service
///
/// Employees log in with provisioned credentials and record one work log
/// per session. Submissions outside the session's time window need an
/// approval code issued to a supervisor.

mod api;
mod auth;
mod config;
mod context;
mod crypto;
mod db;
mod employee;
mod error;
mod gate;
mod jobs;
mod mailer;
mod metrics;
mod rate_limit;
mod server;
mod worklog;

use config::ServerConfig;
use context::AppContext;
use error::AppResult;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shiftlog=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Print banner
    print_banner();

    // Load configuration
    let config = ServerConfig::from_env()?;

    // Create application context
    let ctx = AppContext::new(config).await?;
    let ctx = Arc::new(ctx);

    // Start background jobs
    let scheduler = Arc::new(jobs::JobScheduler::new(Arc::clone(&ctx)));
    scheduler.start();

    // Start server
    server::serve((*ctx).clone()).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
   _____ __    _ ______  __
  / ___// /_  (_) __/ /_/ /   ____  ____ _
  \__ \/ __ \/ / /_/ __/ /   / __ \/ __ `/
 ___/ / / / / / __/ /_/ /___/ /_/ / /_/ /
/____/_/ /_/_/_/  \__/_____/\____/\__, /
                                 /____/

        Employee attendance and work-log service v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
