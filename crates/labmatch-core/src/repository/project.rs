//! Project repository for database operations

use crate::domain::{Difficulty, Project, ProjectStatus};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, warn};
use uuid::Uuid;

/// Repository for project database operations
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    pool: SqlitePool,
}

impl ProjectRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Save a new project
    pub async fn save(&self, project: &Project) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO projects (
                id, title, author_id, difficulty, status,
                applicant_capacity, selection_capacity, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(project.id.to_string())
        .bind(&project.title)
        .bind(project.author_id.to_string())
        .bind(project.difficulty.as_str())
        .bind(project.status.as_str())
        .bind(project.applicant_capacity)
        .bind(project.selection_capacity)
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        debug!(project_id = %project.id, title = %project.title, "Project saved");
        Ok(())
    }

    /// Get a project by ID
    pub async fn get(&self, project_id: Uuid) -> Result<Option<Project>> {
        let row: Option<ProjectRow> = sqlx::query_as(
            r#"
            SELECT id, title, author_id, difficulty, status,
                   applicant_capacity, selection_capacity, created_at, updated_at
            FROM projects
            WHERE id = ?
            "#,
        )
        .bind(project_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        row.map(|r| r.into_project()).transpose()
    }

    /// List all projects, newest first
    pub async fn list(&self) -> Result<Vec<Project>> {
        let rows: Vec<ProjectRow> = sqlx::query_as(
            r#"
            SELECT id, title, author_id, difficulty, status,
                   applicant_capacity, selection_capacity, created_at, updated_at
            FROM projects
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        rows.into_iter().map(|r| r.into_project()).collect()
    }

    /// List projects by status
    pub async fn list_by_status(&self, status: ProjectStatus) -> Result<Vec<Project>> {
        let rows: Vec<ProjectRow> = sqlx::query_as(
            r#"
            SELECT id, title, author_id, difficulty, status,
                   applicant_capacity, selection_capacity, created_at, updated_at
            FROM projects
            WHERE status = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        rows.into_iter().map(|r| r.into_project()).collect()
    }

    /// List projects by author
    pub async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Project>> {
        let rows: Vec<ProjectRow> = sqlx::query_as(
            r#"
            SELECT id, title, author_id, difficulty, status,
                   applicant_capacity, selection_capacity, created_at, updated_at
            FROM projects
            WHERE author_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(author_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        rows.into_iter().map(|r| r.into_project()).collect()
    }

    /// Move an open project to in-progress
    ///
    /// Returns false if the project was not open (or does not exist);
    /// closure happens only through the lifecycle coordinator.
    pub async fn start(&self, project_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE projects SET status = 'in_progress', updated_at = ? WHERE id = ? AND status = 'open'",
        )
        .bind(Utc::now())
        .bind(project_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(result.rows_affected() > 0)
    }
}

/// Database row for a project
#[derive(sqlx::FromRow)]
pub(crate) struct ProjectRow {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) author_id: String,
    pub(crate) difficulty: String,
    pub(crate) status: String,
    pub(crate) applicant_capacity: i64,
    pub(crate) selection_capacity: i64,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl ProjectRow {
    pub(crate) fn into_project(self) -> Result<Project> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| Error::Parse(format!("Invalid project ID: {}", e)))?;
        let author_id = Uuid::parse_str(&self.author_id)
            .map_err(|e| Error::Parse(format!("Invalid author ID: {}", e)))?;
        let status = ProjectStatus::from_str(&self.status)
            .ok_or_else(|| Error::Parse(format!("Invalid project status: {}", self.status)))?;

        // Tolerate an unrecognized difficulty tag: fall back to the
        // intermediate tier rather than failing the whole read
        let difficulty = Difficulty::from_str(&self.difficulty).unwrap_or_else(|| {
            warn!(
                project_id = %self.id,
                difficulty = %self.difficulty,
                "Unrecognized difficulty tag, defaulting to intermediate"
            );
            Difficulty::default()
        });

        Ok(Project {
            id,
            title: self.title,
            author_id,
            difficulty,
            status,
            applicant_capacity: self.applicant_capacity,
            selection_capacity: self.selection_capacity,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
