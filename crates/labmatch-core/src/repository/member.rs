//! Project member repository
//!
//! Member rows are created only by the lifecycle coordinator inside the
//! accepting transaction. This repository covers the read side plus the
//! author-initiated removal of a member.

use crate::domain::ProjectMember;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

/// Repository for project membership operations
#[derive(Debug, Clone)]
pub struct MemberRepository {
    pool: SqlitePool,
}

impl MemberRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List members of a project, in join order
    pub async fn list_by_project(&self, project_id: Uuid) -> Result<Vec<ProjectMember>> {
        let rows: Vec<MemberRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, project_id, joined_at
            FROM project_members
            WHERE project_id = ?
            ORDER BY joined_at
            "#,
        )
        .bind(project_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        rows.into_iter().map(|r| r.into_member()).collect()
    }

    /// List a user's memberships
    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<ProjectMember>> {
        let rows: Vec<MemberRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, project_id, joined_at
            FROM project_members
            WHERE user_id = ?
            ORDER BY joined_at
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        rows.into_iter().map(|r| r.into_member()).collect()
    }

    /// Check whether a user is a member of a project
    pub async fn exists(&self, user_id: Uuid, project_id: Uuid) -> Result<bool> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM project_members WHERE user_id = ? AND project_id = ?",
        )
        .bind(user_id.to_string())
        .bind(project_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(count > 0)
    }

    /// Remove a member from a project
    ///
    /// Returns true if a membership row was deleted. The application row
    /// for the pair is left untouched.
    pub async fn remove(&self, user_id: Uuid, project_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM project_members WHERE user_id = ? AND project_id = ?",
        )
        .bind(user_id.to_string())
        .bind(project_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        let removed = result.rows_affected() > 0;
        if removed {
            debug!(user_id = %user_id, project_id = %project_id, "Member removed");
        }
        Ok(removed)
    }
}

/// Database row for a project membership
#[derive(sqlx::FromRow)]
pub(crate) struct MemberRow {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) project_id: String,
    pub(crate) joined_at: DateTime<Utc>,
}

impl MemberRow {
    pub(crate) fn into_member(self) -> Result<ProjectMember> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| Error::Parse(format!("Invalid member ID: {}", e)))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| Error::Parse(format!("Invalid user ID: {}", e)))?;
        let project_id = Uuid::parse_str(&self.project_id)
            .map_err(|e| Error::Parse(format!("Invalid project ID: {}", e)))?;

        Ok(ProjectMember {
            id,
            user_id,
            project_id,
            joined_at: self.joined_at,
        })
    }
}
