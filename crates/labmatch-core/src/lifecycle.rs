//! Application lifecycle coordinator
//!
//! Owns every multi-entity write in the crate. Each operation that must
//! be atomic (accepting an applicant, closing a project) opens a single
//! transaction, re-reads the rows it depends on inside that transaction,
//! and commits or rolls back as a unit. Capacity checks therefore never
//! act on a cached project row.

use crate::domain::{Application, ApplicationStatus, Project, ProjectMember};
use crate::error::{Error, Result};
use crate::rating::new_rating;
use crate::repository::application::ApplicationRow;
use crate::repository::project::ProjectRow;
use crate::repository::user::UserRow;
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Result of resolving a batch of applications
#[derive(Debug, Default)]
pub struct BulkOutcome {
    /// Applications successfully accepted
    pub accepted: Vec<Uuid>,
    /// Applications successfully rejected
    pub rejected: Vec<Uuid>,
    /// Applications that could not be resolved, with the reason
    pub failures: Vec<(Uuid, Error)>,
}

impl BulkOutcome {
    /// Whether every requested resolution succeeded
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of closing a project
#[derive(Debug)]
pub struct CloseOutcome {
    /// The closed project
    pub project_id: Uuid,
    /// New rating per scored contributor
    pub updated_ratings: HashMap<Uuid, f64>,
    /// Scored user IDs that had no user row and were skipped
    pub skipped: Vec<Uuid>,
}

/// Coordinates application state transitions and project closure
#[derive(Debug, Clone)]
pub struct LifecycleCoordinator {
    pool: SqlitePool,
}

impl LifecycleCoordinator {
    /// Create a coordinator over the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Submit an application for a project.
    ///
    /// The applicant and project must exist, the project must not be
    /// closed, and the pair must not already have an application.
    pub async fn apply(&self, applicant_id: Uuid, project_id: Uuid) -> Result<Application> {
        let user_exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE id = ?")
            .bind(applicant_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::DatabaseError)?;
        if user_exists.is_none() {
            return Err(Error::UserNotFound(applicant_id));
        }

        let project = self
            .fetch_project(project_id)
            .await?
            .ok_or(Error::ProjectNotFound(project_id))?;
        if project.is_closed() {
            return Err(Error::ProjectClosed(project_id));
        }

        let existing: Option<(i64,)> = sqlx::query_as(
            "SELECT 1 FROM applications WHERE applicant_id = ? AND project_id = ?",
        )
        .bind(applicant_id.to_string())
        .bind(project_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;
        if existing.is_some() {
            return Err(Error::DuplicateApplication {
                applicant_id,
                project_id,
            });
        }

        // Guarded insert: the WHERE clause re-checks project status so an
        // apply racing a closure cannot land a row in a closed project, and
        // a unique-index hit from a concurrent duplicate maps to the same
        // conflict outcome as the check above.
        let application = Application::new(applicant_id, project_id);
        let result = sqlx::query(
            r#"
            INSERT INTO applications (id, applicant_id, project_id, status, created_at)
            SELECT ?, ?, ?, ?, ?
            WHERE EXISTS (SELECT 1 FROM projects WHERE id = ? AND status != 'closed')
            "#,
        )
        .bind(application.id.to_string())
        .bind(applicant_id.to_string())
        .bind(project_id.to_string())
        .bind(application.status.as_str())
        .bind(application.created_at)
        .bind(project_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => Error::DuplicateApplication {
                applicant_id,
                project_id,
            },
            _ => Error::DatabaseError(e),
        })?;

        if result.rows_affected() == 0 {
            // The project was closed or deleted between the read and the insert
            return match self.fetch_project(project_id).await? {
                Some(_) => Err(Error::ProjectClosed(project_id)),
                None => Err(Error::ProjectNotFound(project_id)),
            };
        }

        info!(
            application_id = %application.id,
            applicant_id = %applicant_id,
            project_id = %project_id,
            "Application submitted"
        );
        Ok(application)
    }

    /// Withdraw an application, deleting its row outright.
    ///
    /// Legal from any status. Withdrawing an accepted application also
    /// removes the membership row; consumed capacity is not restored.
    pub async fn withdraw(&self, applicant_id: Uuid, project_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::DatabaseError)?;

        let row: Option<ApplicationRow> = sqlx::query_as(
            r#"
            SELECT id, applicant_id, project_id, status, created_at
            FROM applications
            WHERE applicant_id = ? AND project_id = ?
            "#,
        )
        .bind(applicant_id.to_string())
        .bind(project_id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .map_err(Error::DatabaseError)?;

        let application = match row {
            Some(row) => row.into_application()?,
            None => {
                return Err(Error::NotApplied {
                    applicant_id,
                    project_id,
                })
            }
        };

        sqlx::query("DELETE FROM applications WHERE id = ?")
            .bind(application.id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(Error::DatabaseError)?;

        if application.status == ApplicationStatus::Accepted {
            sqlx::query("DELETE FROM project_members WHERE user_id = ? AND project_id = ?")
                .bind(applicant_id.to_string())
                .bind(project_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(Error::DatabaseError)?;
        }

        tx.commit().await.map_err(Error::DatabaseError)?;

        info!(
            application_id = %application.id,
            applicant_id = %applicant_id,
            project_id = %project_id,
            status = %application.status,
            "Application withdrawn"
        );
        Ok(())
    }

    /// Accept a pending application.
    ///
    /// In one transaction: verifies the application is still pending,
    /// re-reads the project and checks the capacity gate, marks the
    /// application accepted, decrements both capacity counters, and
    /// creates the membership row.
    pub async fn accept(&self, application_id: Uuid) -> Result<ProjectMember> {
        let mut tx = self.pool.begin().await.map_err(Error::DatabaseError)?;

        let application = self.fetch_application_tx(&mut tx, application_id).await?;
        if !application.status.is_pending() {
            return Err(Error::InvalidTransition {
                application_id,
                status: application.status,
            });
        }

        let project = self
            .fetch_project_tx(&mut tx, application.project_id)
            .await?
            .ok_or(Error::ProjectNotFound(application.project_id))?;
        if project.is_closed() {
            return Err(Error::ProjectClosed(project.id));
        }
        if !project.can_admit() {
            return Err(Error::CapacityExceeded(project.id));
        }

        sqlx::query("UPDATE applications SET status = 'accepted' WHERE id = ?")
            .bind(application_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(Error::DatabaseError)?;

        sqlx::query(
            r#"
            UPDATE projects
            SET applicant_capacity = applicant_capacity - 1,
                selection_capacity = selection_capacity - 1,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(Utc::now())
        .bind(project.id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(Error::DatabaseError)?;

        let member = ProjectMember::new(application.applicant_id, project.id);
        sqlx::query(
            "INSERT INTO project_members (id, user_id, project_id, joined_at) VALUES (?, ?, ?, ?)",
        )
        .bind(member.id.to_string())
        .bind(member.user_id.to_string())
        .bind(member.project_id.to_string())
        .bind(member.joined_at)
        .execute(&mut *tx)
        .await
        .map_err(Error::DatabaseError)?;

        tx.commit().await.map_err(Error::DatabaseError)?;

        info!(
            application_id = %application_id,
            user_id = %member.user_id,
            project_id = %project.id,
            "Application accepted"
        );
        Ok(member)
    }

    /// Reject a pending application.
    ///
    /// Decrements only the applicant capacity counter; seats are not
    /// consumed by a rejection.
    pub async fn reject(&self, application_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::DatabaseError)?;

        let application = self.fetch_application_tx(&mut tx, application_id).await?;
        if !application.status.is_pending() {
            return Err(Error::InvalidTransition {
                application_id,
                status: application.status,
            });
        }

        let project = self
            .fetch_project_tx(&mut tx, application.project_id)
            .await?
            .ok_or(Error::ProjectNotFound(application.project_id))?;
        if project.is_closed() {
            return Err(Error::ProjectClosed(project.id));
        }

        sqlx::query("UPDATE applications SET status = 'rejected' WHERE id = ?")
            .bind(application_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(Error::DatabaseError)?;

        sqlx::query(
            r#"
            UPDATE projects
            SET applicant_capacity = applicant_capacity - 1,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(Utc::now())
        .bind(project.id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(Error::DatabaseError)?;

        tx.commit().await.map_err(Error::DatabaseError)?;

        info!(
            application_id = %application_id,
            project_id = %project.id,
            "Application rejected"
        );
        Ok(())
    }

    /// Resolve a batch of applications, each in its own transaction.
    ///
    /// A failure on one application never rolls back the others; every
    /// outcome is reported in the returned [`BulkOutcome`]. Rejections
    /// are processed first so seats are not held by applications about
    /// to be turned down.
    pub async fn bulk_resolve(
        &self,
        accepted_ids: &[Uuid],
        rejected_ids: &[Uuid],
    ) -> Result<BulkOutcome> {
        if accepted_ids.is_empty() && rejected_ids.is_empty() {
            return Err(Error::InvalidInput(
                "Bulk resolve requires at least one application".into(),
            ));
        }

        let mut outcome = BulkOutcome::default();

        for &id in rejected_ids {
            match self.reject(id).await {
                Ok(()) => outcome.rejected.push(id),
                Err(e) => {
                    warn!(application_id = %id, error = %e, "Bulk reject failed");
                    outcome.failures.push((id, e));
                }
            }
        }

        for &id in accepted_ids {
            match self.accept(id).await {
                Ok(_) => outcome.accepted.push(id),
                Err(e) => {
                    warn!(application_id = %id, error = %e, "Bulk accept failed");
                    outcome.failures.push((id, e));
                }
            }
        }

        info!(
            accepted = outcome.accepted.len(),
            rejected = outcome.rejected.len(),
            failed = outcome.failures.len(),
            "Bulk resolution finished"
        );
        Ok(outcome)
    }

    /// Close a project and apply the rating update to each scored
    /// contributor.
    ///
    /// Scores are validated before anything is written; a non-finite
    /// score fails the whole call. Inside one transaction the project is
    /// marked closed and each contributor's rating is recomputed from the
    /// project difficulty. Scored IDs with no user row are skipped with a
    /// warning rather than failing the closure.
    pub async fn close_project(
        &self,
        project_id: Uuid,
        scores: &HashMap<Uuid, f64>,
    ) -> Result<CloseOutcome> {
        for (&user_id, &score) in scores {
            if !score.is_finite() {
                return Err(Error::InvalidInput(format!(
                    "Score for user '{}' is not a finite number",
                    user_id
                )));
            }
        }

        let mut tx = self.pool.begin().await.map_err(Error::DatabaseError)?;

        let project = self
            .fetch_project_tx(&mut tx, project_id)
            .await?
            .ok_or(Error::ProjectNotFound(project_id))?;
        if project.is_closed() {
            return Err(Error::ProjectClosed(project_id));
        }

        sqlx::query("UPDATE projects SET status = 'closed', updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(project_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(Error::DatabaseError)?;

        let mut updated_ratings = HashMap::with_capacity(scores.len());
        let mut skipped = Vec::new();

        for (&user_id, &score) in scores {
            let row: Option<UserRow> = sqlx::query_as(
                "SELECT id, name, email, rating, created_at FROM users WHERE id = ?",
            )
            .bind(user_id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::DatabaseError)?;

            let user = match row {
                Some(row) => row.into_user()?,
                None => {
                    warn!(
                        user_id = %user_id,
                        project_id = %project_id,
                        "Scored user not found, skipping rating update"
                    );
                    skipped.push(user_id);
                    continue;
                }
            };

            let updated = new_rating(user.rating, score, project.difficulty);
            sqlx::query("UPDATE users SET rating = ? WHERE id = ?")
                .bind(updated)
                .bind(user_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(Error::DatabaseError)?;

            debug!(
                user_id = %user_id,
                old_rating = user.rating,
                new_rating = updated,
                "Rating updated"
            );
            updated_ratings.insert(user_id, updated);
        }

        tx.commit().await.map_err(Error::DatabaseError)?;

        info!(
            project_id = %project_id,
            rated = updated_ratings.len(),
            skipped = skipped.len(),
            "Project closed"
        );
        Ok(CloseOutcome {
            project_id,
            updated_ratings,
            skipped,
        })
    }

    async fn fetch_project(&self, project_id: Uuid) -> Result<Option<Project>> {
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

    async fn fetch_project_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        project_id: Uuid,
    ) -> Result<Option<Project>> {
        let row: Option<ProjectRow> = sqlx::query_as(
            r#"
            SELECT id, title, author_id, difficulty, status,
                   applicant_capacity, selection_capacity, created_at, updated_at
            FROM projects
            WHERE id = ?
            "#,
        )
        .bind(project_id.to_string())
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::DatabaseError)?;

        row.map(|r| r.into_project()).transpose()
    }

    async fn fetch_application_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        application_id: Uuid,
    ) -> Result<Application> {
        let row: Option<ApplicationRow> = sqlx::query_as(
            "SELECT id, applicant_id, project_id, status, created_at FROM applications WHERE id = ?",
        )
        .bind(application_id.to_string())
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::DatabaseError)?;

        match row {
            Some(row) => row.into_application(),
            None => Err(Error::ApplicationNotFound(application_id)),
        }
    }
}
