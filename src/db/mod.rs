/// Database layer for ShiftLog
///
/// Manages the SQLite connection pool, migrations, and the typed row
/// models for employees, sessions, and work logs.

pub mod employee;
pub mod worklog;

use crate::error::{AppError, AppResult};
use sqlx::sqlite::SqlitePool;
use std::path::Path;

/// Database connection options
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub max_connections: u32,
    pub enable_wal: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            enable_wal: true,
        }
    }
}

/// Create a SQLite connection pool
pub async fn create_pool(path: &Path, options: DatabaseOptions) -> AppResult<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(options.max_connections)
        .connect_with(
            sqlx::sqlite::SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(if options.enable_wal {
                    sqlx::sqlite::SqliteJournalMode::Wal
                } else {
                    sqlx::sqlite::SqliteJournalMode::Delete
                })
                .foreign_keys(true)
                .busy_timeout(std::time::Duration::from_secs(5)),
        )
        .await
        .map_err(|e| AppError::Database(e))?;

    Ok(pool)
}

/// Run migrations for the database
/// Migrations are embedded at compile time from ./migrations directory
pub async fn run_migrations(pool: &SqlitePool) -> AppResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::Internal(format!("Migration failed: {}", e)))?;

    Ok(())
}

/// Test database connection
pub async fn test_connection(pool: &SqlitePool) -> AppResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(|e| AppError::Database(e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_create_pool_and_migrate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("shiftlog.sqlite");

        // Pool creation makes the parent directory and the file
        let pool = create_pool(&path, DatabaseOptions::default()).await.unwrap();
        assert!(path.exists());

        run_migrations(&pool).await.unwrap();
        test_connection(&pool).await.unwrap();

        // Migrated schema is queryable
        sqlx::query("SELECT id, emp_id, password_hash FROM employee")
            .fetch_all(&pool)
            .await
            .unwrap();
        sqlx::query("SELECT id, employee_id, log_date FROM work_log")
            .fetch_all(&pool)
            .await
            .unwrap();
    }
}
