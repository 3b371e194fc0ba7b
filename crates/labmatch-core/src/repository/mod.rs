//! Repositories over the SQLite store
//!
//! Each repository holds a clone of the shared pool and exposes typed
//! queries for one entity. Multi-entity writes that must be atomic live
//! in the lifecycle coordinator instead.

pub mod application;
pub mod member;
pub mod project;
pub mod user;

pub use application::ApplicationRepository;
pub use member::MemberRepository;
pub use project::ProjectRepository;
pub use user::UserRepository;
