//! Application repository for database operations
//!
//! Read-side queries only. Status transitions and row deletion go through
//! the lifecycle coordinator so they happen inside the right transaction.

use crate::domain::{Application, ApplicationStatus};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Repository for application database operations
#[derive(Debug, Clone)]
pub struct ApplicationRepository {
    pool: SqlitePool,
}

impl ApplicationRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get an application by ID
    pub async fn get(&self, application_id: Uuid) -> Result<Option<Application>> {
        let row: Option<ApplicationRow> = sqlx::query_as(
            "SELECT id, applicant_id, project_id, status, created_at FROM applications WHERE id = ?",
        )
        .bind(application_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        row.map(|r| r.into_application()).transpose()
    }

    /// Find the application for a specific (applicant, project) pair
    pub async fn find(&self, applicant_id: Uuid, project_id: Uuid) -> Result<Option<Application>> {
        let row: Option<ApplicationRow> = sqlx::query_as(
            r#"
            SELECT id, applicant_id, project_id, status, created_at
            FROM applications
            WHERE applicant_id = ? AND project_id = ?
            "#,
        )
        .bind(applicant_id.to_string())
        .bind(project_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        row.map(|r| r.into_application()).transpose()
    }

    /// List applications for a project, oldest first
    pub async fn list_by_project(&self, project_id: Uuid) -> Result<Vec<Application>> {
        let rows: Vec<ApplicationRow> = sqlx::query_as(
            r#"
            SELECT id, applicant_id, project_id, status, created_at
            FROM applications
            WHERE project_id = ?
            ORDER BY created_at
            "#,
        )
        .bind(project_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        rows.into_iter().map(|r| r.into_application()).collect()
    }

    /// List a user's applications, newest first
    pub async fn list_by_applicant(&self, applicant_id: Uuid) -> Result<Vec<Application>> {
        let rows: Vec<ApplicationRow> = sqlx::query_as(
            r#"
            SELECT id, applicant_id, project_id, status, created_at
            FROM applications
            WHERE applicant_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(applicant_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        rows.into_iter().map(|r| r.into_application()).collect()
    }

    /// Count pending applications for a project
    pub async fn count_pending(&self, project_id: Uuid) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM applications WHERE project_id = ? AND status = 'pending'",
        )
        .bind(project_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(count)
    }
}

/// Database row for an application
#[derive(sqlx::FromRow)]
pub(crate) struct ApplicationRow {
    pub(crate) id: String,
    pub(crate) applicant_id: String,
    pub(crate) project_id: String,
    pub(crate) status: String,
    pub(crate) created_at: DateTime<Utc>,
}

impl ApplicationRow {
    pub(crate) fn into_application(self) -> Result<Application> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| Error::Parse(format!("Invalid application ID: {}", e)))?;
        let applicant_id = Uuid::parse_str(&self.applicant_id)
            .map_err(|e| Error::Parse(format!("Invalid applicant ID: {}", e)))?;
        let project_id = Uuid::parse_str(&self.project_id)
            .map_err(|e| Error::Parse(format!("Invalid project ID: {}", e)))?;
        let status = ApplicationStatus::from_str(&self.status)
            .ok_or_else(|| Error::Parse(format!("Invalid application status: {}", self.status)))?;

        Ok(Application {
            id,
            applicant_id,
            project_id,
            status,
            created_at: self.created_at,
        })
    }
}
