//! Error types for labmatch

use crate::domain::ApplicationStatus;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias using labmatch's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Labmatch error types
///
/// Every variant except `DatabaseError` and `Parse` is an expected
/// domain outcome the caller is meant to branch on. `code()` gives the
/// stable status string the caller-facing layer maps each outcome to, so
/// storage-layer error text never leaks across the boundary.
#[derive(Error, Debug)]
pub enum Error {
    // Not-found outcomes
    #[error("User '{0}' not found")]
    UserNotFound(Uuid),

    #[error("Project '{0}' not found")]
    ProjectNotFound(Uuid),

    #[error("Application '{0}' not found")]
    ApplicationNotFound(Uuid),

    #[error("User '{applicant_id}' has no application for project '{project_id}'")]
    NotApplied {
        applicant_id: Uuid,
        project_id: Uuid,
    },

    // Conflict
    #[error("User '{applicant_id}' has already applied to project '{project_id}'")]
    DuplicateApplication {
        applicant_id: Uuid,
        project_id: Uuid,
    },

    // Invalid state
    #[error("Application '{application_id}' is {status}, only pending applications can be resolved")]
    InvalidTransition {
        application_id: Uuid,
        status: ApplicationStatus,
    },

    #[error("Project '{0}' is closed")]
    ProjectClosed(Uuid),

    // Capacity
    #[error("Project '{0}' has no remaining selection capacity")]
    CapacityExceeded(Uuid),

    // Input errors, rejected before any store access
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Storage errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Stable status code for this error, suitable for the caller boundary
    pub fn code(&self) -> &'static str {
        match self {
            Self::UserNotFound(_)
            | Self::ProjectNotFound(_)
            | Self::ApplicationNotFound(_)
            | Self::NotApplied { .. } => "not_found",
            Self::DuplicateApplication { .. } => "conflict",
            Self::InvalidTransition { .. } | Self::ProjectClosed(_) => "invalid_state",
            Self::CapacityExceeded(_) => "capacity_exceeded",
            Self::InvalidInput(_) => "validation",
            Self::DatabaseError(_) | Self::Parse(_) => "storage",
        }
    }

    /// Whether this error is an expected domain outcome rather than a
    /// storage-layer failure
    pub fn is_domain(&self) -> bool {
        !matches!(self, Self::DatabaseError(_) | Self::Parse(_))
    }
}
