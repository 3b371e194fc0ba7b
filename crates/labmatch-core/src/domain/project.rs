//! Project entity and related types
//!
//! A project is created by a professor and collects applications from
//! students. Capacity is tracked with two counters: `applicant_capacity`
//! (applications the project will still review) and `selection_capacity`
//! (seats still open on the team).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Project difficulty tier, feeding the rating engine's reference rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    /// Create from string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    /// Numeric toughness tier (1..=3)
    pub fn toughness(&self) -> u8 {
        match self {
            Self::Beginner => 1,
            Self::Intermediate => 2,
            Self::Advanced => 3,
        }
    }

    /// Reference rating a contributor's performance is measured against
    pub fn reference_rating(&self) -> f64 {
        match self {
            Self::Beginner => 800.0,
            Self::Intermediate => 1400.0,
            Self::Advanced => 2000.0,
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::Intermediate
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Accepting applications
    Open,
    /// Team selected, work underway
    InProgress,
    /// Concluded; no further transitions or member creation
    Closed,
}

impl ProjectStatus {
    /// Create from string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "open" => Some(Self::Open),
            "in_progress" => Some(Self::InProgress),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A research project authored by a professor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique project identifier
    pub id: Uuid,

    /// Project title
    pub title: String,

    /// Authoring professor
    pub author_id: Uuid,

    /// Difficulty tier
    pub difficulty: Difficulty,

    /// Current lifecycle status
    pub status: ProjectStatus,

    /// Applications the project will still review
    pub applicant_capacity: i64,

    /// Seats still open on the team; never negative
    pub selection_capacity: i64,

    /// When the project was created
    pub created_at: DateTime<Utc>,

    /// When the project was last updated
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a new open project
    pub fn new(
        title: impl Into<String>,
        author_id: Uuid,
        difficulty: Difficulty,
        applicant_capacity: i64,
        selection_capacity: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            author_id,
            difficulty,
            status: ProjectStatus::Open,
            applicant_capacity,
            selection_capacity,
            created_at: now,
            updated_at: now,
        }
    }

    /// Capacity gate: whether the project can admit one more member
    ///
    /// True iff the project is not closed and a seat is still open. The
    /// lifecycle coordinator re-evaluates this on a row read inside the
    /// accepting transaction, never on a cached value.
    pub fn can_admit(&self) -> bool {
        self.status != ProjectStatus::Closed && self.selection_capacity > 0
    }

    /// Check if the project has concluded
    pub fn is_closed(&self) -> bool {
        self.status == ProjectStatus::Closed
    }
}
