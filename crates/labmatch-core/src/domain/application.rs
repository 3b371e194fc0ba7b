//! Application entity and status state machine
//!
//! An application links one applicant to one project. Status transitions
//! are `Pending -> Accepted` and `Pending -> Rejected`; both targets are
//! terminal for the row. Withdrawal deletes the row outright and is legal
//! from any status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Application status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    /// Awaiting a professor's decision
    Pending,
    /// Accepted; a project member row exists for the pair
    Accepted,
    /// Rejected
    Rejected,
}

impl ApplicationStatus {
    /// Create from string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    /// Whether an accept/reject transition is still legal
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Whether the status is terminal (accepted or rejected)
    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A student's application to a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    /// Unique application identifier
    pub id: Uuid,

    /// Applying student
    pub applicant_id: Uuid,

    /// Target project
    pub project_id: Uuid,

    /// Current status
    pub status: ApplicationStatus,

    /// When the application was submitted
    pub created_at: DateTime<Utc>,
}

impl Application {
    /// Create a new pending application
    pub fn new(applicant_id: Uuid, project_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            applicant_id,
            project_id,
            status: ApplicationStatus::Pending,
            created_at: Utc::now(),
        }
    }
}
