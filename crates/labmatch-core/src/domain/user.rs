//! User entity
//!
//! Holds the contributor's Elo-like skill rating. The rating is mutated
//! exclusively by the close-project workflow, never elsewhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Starting rating for new contributors
pub const DEFAULT_RATING: f64 = 1000.0;

/// A platform user (student contributor or professor)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// E-mail address, unique across users
    pub email: String,

    /// Skill rating, updated only at project closure
    pub rating: f64,

    /// When the user record was created
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with the default rating
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            rating: DEFAULT_RATING,
            created_at: Utc::now(),
        }
    }
}
