//! Labmatch Core Library
//!
//! This crate provides the core functionality for labmatch, including:
//! - Domain entities (users, projects, applications, memberships)
//! - Application lifecycle coordination (apply, withdraw, accept, reject,
//!   bulk resolution, project closure)
//! - Elo-style contributor rating engine
//! - Storage (SQLite with versioned migrations)

pub mod domain;
pub mod error;
pub mod lifecycle;
pub mod rating;
pub mod repository;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::domain::{
        Application, ApplicationStatus, Difficulty, Project, ProjectMember, ProjectStatus, User,
    };
    pub use crate::error::{Error, Result};
    pub use crate::lifecycle::{BulkOutcome, CloseOutcome, LifecycleCoordinator};
    pub use crate::storage::{Database, DatabaseConfig};
}
