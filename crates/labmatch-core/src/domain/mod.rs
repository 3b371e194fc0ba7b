//! Domain entities and their state machines
//!
//! Status transitions are modeled as explicit enums with a single
//! `from_str`/`as_str` pair each; illegal transitions are matched cases,
//! never ad hoc string comparisons.

pub mod application;
pub mod member;
pub mod project;
pub mod user;

pub use application::{Application, ApplicationStatus};
pub use member::ProjectMember;
pub use project::{Difficulty, Project, ProjectStatus};
pub use user::{User, DEFAULT_RATING};
