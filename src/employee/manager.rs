/// Employee manager implementation using runtime queries
/// This version uses sqlx runtime query building instead of compile-time macros
/// to avoid needing DATABASE_URL during compilation

use crate::{
    config::ServerConfig,
    crypto::password,
    db::employee::{Employee, EmployeeSession},
    employee::ValidatedSession,
    error::{AppError, AppResult},
};
use chrono::{DateTime, Duration, Utc};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

/// Employee manager service
pub struct EmployeeManager {
    db: SqlitePool,
    config: Arc<ServerConfig>,
}

impl EmployeeManager {
    /// Create a new employee manager
    pub fn new(db: SqlitePool, config: Arc<ServerConfig>) -> Self {
        Self { db, config }
    }

    /// Authenticate an employee and create a session
    ///
    /// Unknown identifiers, inactive accounts, and wrong passwords all
    /// fail with the same message so the response does not reveal which
    /// part was wrong.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
    ) -> AppResult<(Employee, EmployeeSession)> {
        let employee = match self.get_by_identifier(identifier).await? {
            Some(employee) if employee.is_active => employee,
            _ => {
                crate::metrics::record_login(false);
                return Err(AppError::Authentication(
                    "Invalid identifier or password".to_string(),
                ));
            }
        };

        if !password::verify(password, &employee.password_hash) {
            crate::metrics::record_login(false);
            return Err(AppError::Authentication(
                "Invalid identifier or password".to_string(),
            ));
        }

        let session = self.create_session(&employee).await?;
        crate::metrics::record_login(true);
        tracing::info!(emp_id = %employee.emp_id, "Employee logged in");

        Ok((employee, session))
    }

    /// Create a session for an employee
    pub async fn create_session(&self, employee: &Employee) -> AppResult<EmployeeSession> {
        let session_id = Uuid::new_v4().to_string();
        let access_token = self.generate_access_token(employee, &session_id)?;

        let now = Utc::now();
        let expires_at = now + Duration::hours(self.config.authentication.session_ttl_hours);

        sqlx::query(
            "INSERT INTO employee_session (id, employee_id, access_token, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&session_id)
        .bind(employee.id)
        .bind(&access_token)
        .bind(now)
        .bind(expires_at)
        .execute(&self.db)
        .await
        .map_err(|e| AppError::Database(e))?;

        Ok(EmployeeSession {
            id: session_id,
            employee_id: employee.id,
            access_token,
            created_at: now,
            expires_at,
        })
    }

    /// Validate access token and return session info
    pub async fn validate_access_token(&self, token: &str) -> AppResult<ValidatedSession> {
        let row = sqlx::query(
            "SELECT s.id AS session_id, s.employee_id, s.expires_at, e.emp_id, e.is_active
             FROM employee_session s
             JOIN employee e ON e.id = s.employee_id
             WHERE s.access_token = ?1",
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| AppError::Database(e))?
        .ok_or_else(|| AppError::Authentication("Invalid or expired session".to_string()))?;

        let expires_at: DateTime<Utc> = row.get("expires_at");
        if Utc::now() > expires_at {
            return Err(AppError::Authentication("Session expired".to_string()));
        }

        // A deactivated employee loses existing sessions too
        let is_active: bool = row.get("is_active");
        if !is_active {
            return Err(AppError::Authentication(
                "Invalid or expired session".to_string(),
            ));
        }

        Ok(ValidatedSession {
            employee_id: row.get("employee_id"),
            emp_id: row.get("emp_id"),
            session_id: row.get("session_id"),
        })
    }

    /// Delete a session (logout)
    pub async fn delete_session(&self, session_id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM employee_session WHERE id = ?1")
            .bind(session_id)
            .execute(&self.db)
            .await
            .map_err(|e| AppError::Database(e))?;

        Ok(())
    }

    /// Get an employee by database id
    pub async fn get_by_id(&self, employee_id: i64) -> AppResult<Employee> {
        let row = sqlx::query(
            "SELECT id, emp_id, email, full_name, role, password_hash, is_active,
                    first_login, created_at, updated_at
             FROM employee WHERE id = ?1",
        )
        .bind(employee_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| AppError::Database(e))?
        .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

        Ok(Employee {
            id: row.get("id"),
            emp_id: row.get("emp_id"),
            email: row.get("email"),
            full_name: row.get("full_name"),
            role: row.get("role"),
            password_hash: row.get("password_hash"),
            is_active: row.get("is_active"),
            first_login: row.get("first_login"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    /// Replace the employee's password after checking the current one.
    /// Clears the first-login flag so provisioned credentials stop
    /// prompting for a change.
    pub async fn change_password(
        &self,
        employee_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        if new_password.len() < 8 {
            return Err(AppError::Validation(
                "New password must be at least 8 characters".to_string(),
            ));
        }

        let employee = self.get_by_id(employee_id).await?;

        if !password::verify(current_password, &employee.password_hash) {
            return Err(AppError::Authentication(
                "Current password is incorrect".to_string(),
            ));
        }

        let password_hash =
            password::hash(new_password, self.config.authentication.password_iterations);

        sqlx::query(
            "UPDATE employee SET password_hash = ?1, first_login = 0, updated_at = ?2
             WHERE id = ?3",
        )
        .bind(&password_hash)
        .bind(Utc::now())
        .bind(employee_id)
        .execute(&self.db)
        .await
        .map_err(|e| AppError::Database(e))?;

        tracing::info!(emp_id = %employee.emp_id, "Password changed");

        Ok(())
    }

    /// Cleanup expired sessions
    ///
    /// This should be called periodically (e.g., hourly) to remove
    /// expired sessions from the database.
    pub async fn cleanup_expired_sessions(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM employee_session WHERE expires_at < ?1")
            .bind(Utc::now())
            .execute(&self.db)
            .await
            .map_err(|e| AppError::Database(e))?;

        let deleted = result.rows_affected();

        let row = sqlx::query("SELECT COUNT(*) AS count FROM employee_session")
            .fetch_one(&self.db)
            .await
            .map_err(|e| AppError::Database(e))?;
        let active: i64 = row.get("count");
        crate::metrics::set_active_sessions(active);

        if deleted > 0 {
            tracing::info!(deleted, "Cleaned up expired sessions");
        } else {
            tracing::debug!("Session cleanup: no expired sessions found");
        }

        Ok(deleted)
    }

    /// Find an employee by employee code or email
    async fn get_by_identifier(&self, identifier: &str) -> AppResult<Option<Employee>> {
        let identifier = identifier.trim();
        if identifier.contains('@') {
            self.get_by_email(&identifier.to_lowercase()).await
        } else {
            self.get_by_emp_id(&identifier.to_uppercase()).await
        }
    }

    /// Find an employee by employee code
    async fn get_by_emp_id(&self, emp_id: &str) -> AppResult<Option<Employee>> {
        let row = sqlx::query(
            "SELECT id, emp_id, email, full_name, role, password_hash, is_active,
                    first_login, created_at, updated_at
             FROM employee WHERE emp_id = ?1",
        )
        .bind(emp_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| AppError::Database(e))?;

        Ok(row.map(|row| Employee {
            id: row.get("id"),
            emp_id: row.get("emp_id"),
            email: row.get("email"),
            full_name: row.get("full_name"),
            role: row.get("role"),
            password_hash: row.get("password_hash"),
            is_active: row.get("is_active"),
            first_login: row.get("first_login"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }))
    }

    /// Find an employee by email
    async fn get_by_email(&self, email: &str) -> AppResult<Option<Employee>> {
        let row = sqlx::query(
            "SELECT id, emp_id, email, full_name, role, password_hash, is_active,
                    first_login, created_at, updated_at
             FROM employee WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| AppError::Database(e))?;

        Ok(row.map(|row| Employee {
            id: row.get("id"),
            emp_id: row.get("emp_id"),
            email: row.get("email"),
            full_name: row.get("full_name"),
            role: row.get("role"),
            password_hash: row.get("password_hash"),
            is_active: row.get("is_active"),
            first_login: row.get("first_login"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }))
    }

    /// Generate access JWT token
    fn generate_access_token(&self, employee: &Employee, session_id: &str) -> AppResult<String> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        use serde::{Deserialize, Serialize};

        #[derive(Debug, Serialize, Deserialize)]
        struct Claims {
            sub: String,
            sid: String,
            iat: i64,
            exp: i64,
        }

        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: employee.emp_id.clone(),
            sid: session_id.to_string(),
            iat: now,
            exp: now + self.config.authentication.session_ttl_hours * 3600,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.authentication.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Jwt(format!("Failed to generate token: {}", e)))?;

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::*;
    use chrono::NaiveTime;
    use std::path::PathBuf;

    fn test_server_config() -> Arc<ServerConfig> {
        Arc::new(ServerConfig {
            service: ServiceConfig {
                hostname: "localhost".to_string(),
                port: 8090,
                version: "0.1.0".to_string(),
            },
            storage: StorageConfig {
                data_directory: PathBuf::from("./data"),
                database: PathBuf::from(":memory:"),
            },
            authentication: AuthConfig {
                jwt_secret: "test-secret-key-for-testing-only-1234".to_string(),
                session_ttl_hours: 12,
                // Low iteration count keeps the tests fast
                password_iterations: 1000,
            },
            gate: GateConfig {
                timezone_offset_minutes: 330,
                first_half_start: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
                first_half_end: NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
                second_half_start: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
                second_half_end: NaiveTime::from_hms_opt(19, 30, 0).unwrap(),
                approval_code_ttl_minutes: 15,
            },
            email: None,
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        })
    }

    async fn create_test_manager() -> EmployeeManager {
        // Create in-memory database
        let db = SqlitePool::connect(":memory:").await.unwrap();

        // Create tables
        sqlx::query(
            r#"
            CREATE TABLE employee (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                emp_id TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL,
                full_name TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'EMPLOYEE',
                password_hash TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                first_login BOOLEAN NOT NULL DEFAULT 1,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(&db)
        .await
        .unwrap();

        sqlx::query(
            r#"
            CREATE TABLE employee_session (
                id TEXT PRIMARY KEY,
                employee_id INTEGER NOT NULL,
                access_token TEXT UNIQUE NOT NULL,
                created_at DATETIME NOT NULL,
                expires_at DATETIME NOT NULL,
                FOREIGN KEY (employee_id) REFERENCES employee(id)
            )
            "#,
        )
        .execute(&db)
        .await
        .unwrap();

        EmployeeManager::new(db, test_server_config())
    }

    async fn seed_employee(manager: &EmployeeManager, emp_id: &str, email: &str, active: bool) {
        let hash = password::hash("Temp@123", 1000);
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO employee (emp_id, email, full_name, role, password_hash, is_active,
                                   first_login, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8)",
        )
        .bind(emp_id)
        .bind(email)
        .bind("Asha Nair")
        .bind("EMPLOYEE")
        .bind(&hash)
        .bind(active)
        .bind(now)
        .bind(now)
        .execute(&manager.db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_login_by_emp_id_and_email() {
        let manager = create_test_manager().await;
        seed_employee(&manager, "EMP1023", "asha@example.com", true).await;

        let (employee, session) = manager.login("EMP1023", "Temp@123").await.unwrap();
        assert_eq!(employee.emp_id, "EMP1023");
        assert!(!session.access_token.is_empty());

        let (employee, _) = manager.login("asha@example.com", "Temp@123").await.unwrap();
        assert_eq!(employee.emp_id, "EMP1023");
    }

    #[tokio::test]
    async fn test_login_normalizes_identifier_case() {
        let manager = create_test_manager().await;
        seed_employee(&manager, "EMP1023", "asha@example.com", true).await;

        manager.login("emp1023", "Temp@123").await.unwrap();
        manager.login("Asha@Example.com", "Temp@123").await.unwrap();
    }

    #[tokio::test]
    async fn test_login_failures_share_one_message() {
        let manager = create_test_manager().await;
        seed_employee(&manager, "EMP1023", "asha@example.com", true).await;
        seed_employee(&manager, "EMP2044", "ravi@example.com", false).await;

        let wrong_password = manager.login("EMP1023", "nope").await.unwrap_err();
        let unknown = manager.login("EMP9999", "Temp@123").await.unwrap_err();
        let inactive = manager.login("EMP2044", "Temp@123").await.unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown.to_string());
        assert_eq!(unknown.to_string(), inactive.to_string());
        assert!(matches!(unknown, AppError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_validate_access_token() {
        let manager = create_test_manager().await;
        seed_employee(&manager, "EMP1023", "asha@example.com", true).await;
        let (employee, session) = manager.login("EMP1023", "Temp@123").await.unwrap();

        let validated = manager
            .validate_access_token(&session.access_token)
            .await
            .unwrap();
        assert_eq!(validated.employee_id, employee.id);
        assert_eq!(validated.emp_id, "EMP1023");
        assert_eq!(validated.session_id, session.id);

        let err = manager.validate_access_token("bogus-token").await.unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected() {
        let manager = create_test_manager().await;
        seed_employee(&manager, "EMP1023", "asha@example.com", true).await;
        let (_, session) = manager.login("EMP1023", "Temp@123").await.unwrap();

        sqlx::query("UPDATE employee_session SET expires_at = ?1 WHERE id = ?2")
            .bind(Utc::now() - Duration::hours(1))
            .bind(&session.id)
            .execute(&manager.db)
            .await
            .unwrap();

        let err = manager
            .validate_access_token(&session.access_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_logout_deletes_session() {
        let manager = create_test_manager().await;
        seed_employee(&manager, "EMP1023", "asha@example.com", true).await;
        let (_, session) = manager.login("EMP1023", "Temp@123").await.unwrap();

        manager.delete_session(&session.id).await.unwrap();

        let err = manager
            .validate_access_token(&session.access_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_change_password_clears_first_login() {
        let manager = create_test_manager().await;
        seed_employee(&manager, "EMP1023", "asha@example.com", true).await;
        let (employee, _) = manager.login("EMP1023", "Temp@123").await.unwrap();
        assert!(employee.first_login);

        manager
            .change_password(employee.id, "Temp@123", "NewSecret9")
            .await
            .unwrap();

        let updated = manager.get_by_id(employee.id).await.unwrap();
        assert!(!updated.first_login);

        // Old credential no longer works, the new one does
        assert!(manager.login("EMP1023", "Temp@123").await.is_err());
        manager.login("EMP1023", "NewSecret9").await.unwrap();
    }

    #[tokio::test]
    async fn test_change_password_checks_current() {
        let manager = create_test_manager().await;
        seed_employee(&manager, "EMP1023", "asha@example.com", true).await;
        let (employee, _) = manager.login("EMP1023", "Temp@123").await.unwrap();

        let err = manager
            .change_password(employee.id, "wrong", "NewSecret9")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));

        let err = manager
            .change_password(employee.id, "Temp@123", "short")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_cleanup_expired_sessions() {
        let manager = create_test_manager().await;
        seed_employee(&manager, "EMP1023", "asha@example.com", true).await;
        let (_, expired) = manager.login("EMP1023", "Temp@123").await.unwrap();
        let (_, live) = manager.login("EMP1023", "Temp@123").await.unwrap();

        sqlx::query("UPDATE employee_session SET expires_at = ?1 WHERE id = ?2")
            .bind(Utc::now() - Duration::hours(1))
            .bind(&expired.id)
            .execute(&manager.db)
            .await
            .unwrap();

        let deleted = manager.cleanup_expired_sessions().await.unwrap();
        assert_eq!(deleted, 1);

        manager.validate_access_token(&live.access_token).await.unwrap();
    }
}
