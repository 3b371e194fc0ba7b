//! Project member entity
//!
//! A member row exists for a (user, project) pair iff that pair has a
//! committed accepted application. The row is created inside the same
//! transaction that accepts the application; it may later be deleted by
//! the project's author independently of the application record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's membership in a project team
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMember {
    /// Unique membership identifier
    pub id: Uuid,

    /// Member user
    pub user_id: Uuid,

    /// Project joined
    pub project_id: Uuid,

    /// When the membership was created
    pub joined_at: DateTime<Utc>,
}

impl ProjectMember {
    /// Create a new membership for an accepted applicant
    pub fn new(user_id: Uuid, project_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            project_id,
            joined_at: Utc::now(),
        }
    }
}
