//! Labmatch Core Integration Tests
//!
//! End-to-end scenarios over the public API: a full recruiting round from
//! application through closure, capacity enforcement under contention, and
//! the rating update at the end of a project.

use labmatch_core::{
    domain::{ApplicationStatus, Difficulty, Project, ProjectStatus, User, DEFAULT_RATING},
    lifecycle::LifecycleCoordinator,
    repository::{ApplicationRepository, MemberRepository, ProjectRepository, UserRepository},
    storage::Database,
    Error,
};
use std::collections::HashMap;
use uuid::Uuid;

struct TestApp {
    db: Database,
    coordinator: LifecycleCoordinator,
    users: UserRepository,
    projects: ProjectRepository,
    applications: ApplicationRepository,
    members: MemberRepository,
}

impl TestApp {
    async fn new() -> Self {
        let db = Database::in_memory()
            .await
            .expect("Failed to create test database");
        let pool = db.pool().clone();
        Self {
            coordinator: LifecycleCoordinator::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            projects: ProjectRepository::new(pool.clone()),
            applications: ApplicationRepository::new(pool.clone()),
            members: MemberRepository::new(pool),
            db,
        }
    }

    async fn user(&self, name: &str, email: &str) -> User {
        let user = User::new(name, email);
        self.users.save(&user).await.expect("Failed to save user");
        user
    }

    async fn project(
        &self,
        author: &User,
        difficulty: Difficulty,
        applicants: i64,
        seats: i64,
    ) -> Project {
        let project = Project::new("Research project", author.id, difficulty, applicants, seats);
        self.projects
            .save(&project)
            .await
            .expect("Failed to save project");
        project
    }
}

#[tokio::test]
async fn test_full_recruiting_round() {
    let app = TestApp::new().await;

    let prof = app.user("Prof", "prof@example.edu").await;
    let alice = app.user("Alice", "alice@example.edu").await;
    let bob = app.user("Bob", "bob@example.edu").await;
    let carol = app.user("Carol", "carol@example.edu").await;

    let project = app.project(&prof, Difficulty::Intermediate, 10, 2).await;

    let a_alice = app.coordinator.apply(alice.id, project.id).await.unwrap();
    let a_bob = app.coordinator.apply(bob.id, project.id).await.unwrap();
    let a_carol = app.coordinator.apply(carol.id, project.id).await.unwrap();

    app.coordinator.accept(a_alice.id).await.unwrap();
    app.coordinator.accept(a_bob.id).await.unwrap();
    app.coordinator.reject(a_carol.id).await.unwrap();

    // Team of two, three applications reviewed
    let members = app.members.list_by_project(project.id).await.unwrap();
    assert_eq!(members.len(), 2);
    let after = app.projects.get(project.id).await.unwrap().unwrap();
    assert_eq!(after.selection_capacity, 0);
    assert_eq!(after.applicant_capacity, 7);

    // Close with scores for the two members
    let mut scores = HashMap::new();
    scores.insert(alice.id, 8.0);
    scores.insert(bob.id, 4.0);
    let outcome = app.coordinator.close_project(project.id, &scores).await.unwrap();

    assert_eq!(outcome.updated_ratings.len(), 2);
    assert!(outcome.updated_ratings[&alice.id] > DEFAULT_RATING);
    assert!(outcome.updated_ratings[&bob.id] < DEFAULT_RATING);

    // Carol's rating is untouched
    let carol_after = app.users.get(carol.id).await.unwrap().unwrap();
    assert_eq!(carol_after.rating, DEFAULT_RATING);

    let closed = app.projects.get(project.id).await.unwrap().unwrap();
    assert_eq!(closed.status, ProjectStatus::Closed);
}

#[tokio::test]
async fn test_capacity_gate_over_three_accepts() {
    let app = TestApp::new().await;
    let prof = app.user("Prof", "prof@example.edu").await;
    let project = app.project(&prof, Difficulty::Beginner, 10, 2).await;

    let mut application_ids = Vec::new();
    for i in 0..3 {
        let student = app
            .user(&format!("S{}", i), &format!("s{}@example.edu", i))
            .await;
        let a = app.coordinator.apply(student.id, project.id).await.unwrap();
        application_ids.push(a.id);
    }

    assert!(app.coordinator.accept(application_ids[0]).await.is_ok());
    assert!(app.coordinator.accept(application_ids[1]).await.is_ok());

    let err = app.coordinator.accept(application_ids[2]).await.unwrap_err();
    assert!(matches!(err, Error::CapacityExceeded(_)));
    assert_eq!(err.code(), "capacity_exceeded");

    // The third application is still pending, not silently consumed
    let third = app
        .applications
        .get(application_ids[2])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(third.status, ApplicationStatus::Pending);

    let after = app.projects.get(project.id).await.unwrap().unwrap();
    assert_eq!(after.selection_capacity, 0);
    assert!(!after.can_admit());
}

#[tokio::test]
async fn test_rating_update_known_value() {
    let app = TestApp::new().await;
    let prof = app.user("Prof", "prof@example.edu").await;
    let student = app.user("Student", "student@example.edu").await;
    let project = app.project(&prof, Difficulty::Intermediate, 5, 2).await;

    // rating 1000, score 7/10, intermediate difficulty
    let mut scores = HashMap::new();
    scores.insert(student.id, 7.0);
    let outcome = app.coordinator.close_project(project.id, &scores).await.unwrap();

    let updated = outcome.updated_ratings[&student.id];
    assert!(
        (updated - 1037.090909090909).abs() < 1e-6,
        "expected ~1037.09, got {updated}"
    );

    let stored = app.users.get(student.id).await.unwrap().unwrap();
    assert!((stored.rating - updated).abs() < 1e-9);
}

#[tokio::test]
async fn test_withdraw_missing_application() {
    let app = TestApp::new().await;
    let prof = app.user("Prof", "prof@example.edu").await;
    let student = app.user("Student", "student@example.edu").await;
    let project = app.project(&prof, Difficulty::Beginner, 5, 2).await;

    let err = app
        .coordinator
        .withdraw(student.id, project.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotApplied { .. }));
    assert_eq!(err.code(), "not_found");
}

#[tokio::test]
async fn test_apply_withdraw_reapply_cycle() {
    let app = TestApp::new().await;
    let prof = app.user("Prof", "prof@example.edu").await;
    let student = app.user("Student", "student@example.edu").await;
    let project = app.project(&prof, Difficulty::Beginner, 5, 2).await;

    app.coordinator.apply(student.id, project.id).await.unwrap();
    let err = app.coordinator.apply(student.id, project.id).await.unwrap_err();
    assert_eq!(err.code(), "conflict");

    app.coordinator.withdraw(student.id, project.id).await.unwrap();
    let again = app.coordinator.apply(student.id, project.id).await.unwrap();
    assert_eq!(again.status, ApplicationStatus::Pending);
}

#[tokio::test]
async fn test_bulk_resolution_round() {
    let app = TestApp::new().await;
    let prof = app.user("Prof", "prof@example.edu").await;
    let project = app.project(&prof, Difficulty::Intermediate, 10, 2).await;

    let mut ids = Vec::new();
    for i in 0..4 {
        let student = app
            .user(&format!("S{}", i), &format!("s{}@example.edu", i))
            .await;
        ids.push(app.coordinator.apply(student.id, project.id).await.unwrap().id);
    }

    let outcome = app
        .coordinator
        .bulk_resolve(&[ids[0], ids[1]], &[ids[2], ids[3]])
        .await
        .unwrap();

    assert!(outcome.is_complete());
    assert_eq!(outcome.accepted.len(), 2);
    assert_eq!(outcome.rejected.len(), 2);

    let after = app.projects.get(project.id).await.unwrap().unwrap();
    assert_eq!(after.applicant_capacity, 6);
    assert_eq!(after.selection_capacity, 0);
    assert_eq!(app.members.list_by_project(project.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_close_project_skips_unknown_scored_users() {
    let app = TestApp::new().await;
    let prof = app.user("Prof", "prof@example.edu").await;
    let student = app.user("Student", "student@example.edu").await;
    let project = app.project(&prof, Difficulty::Advanced, 5, 2).await;

    let ghost = Uuid::new_v4();
    let mut scores = HashMap::new();
    scores.insert(student.id, 6.0);
    scores.insert(ghost, 6.0);

    let outcome = app.coordinator.close_project(project.id, &scores).await.unwrap();
    assert_eq!(outcome.skipped, vec![ghost]);
    assert_eq!(outcome.updated_ratings.len(), 1);

    // Closure still landed despite the bad ID
    let closed = app.projects.get(project.id).await.unwrap().unwrap();
    assert_eq!(closed.status, ProjectStatus::Closed);
}

#[tokio::test]
async fn test_closed_project_refuses_everything() {
    let app = TestApp::new().await;
    let prof = app.user("Prof", "prof@example.edu").await;
    let student = app.user("Student", "student@example.edu").await;
    let late = app.user("Late", "late@example.edu").await;
    let project = app.project(&prof, Difficulty::Beginner, 5, 2).await;

    let pending = app.coordinator.apply(student.id, project.id).await.unwrap();
    app.coordinator
        .close_project(project.id, &HashMap::new())
        .await
        .unwrap();

    let err = app.coordinator.apply(late.id, project.id).await.unwrap_err();
    assert_eq!(err.code(), "invalid_state");

    let err = app.coordinator.accept(pending.id).await.unwrap_err();
    assert!(matches!(err, Error::ProjectClosed(_)));

    let err = app.coordinator.reject(pending.id).await.unwrap_err();
    assert!(matches!(err, Error::ProjectClosed(_)));

    let err = app
        .coordinator
        .close_project(project.id, &HashMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ProjectClosed(_)));
}

#[tokio::test]
async fn test_member_removal_after_acceptance() {
    let app = TestApp::new().await;
    let prof = app.user("Prof", "prof@example.edu").await;
    let student = app.user("Student", "student@example.edu").await;
    let project = app.project(&prof, Difficulty::Beginner, 5, 2).await;

    let a = app.coordinator.apply(student.id, project.id).await.unwrap();
    app.coordinator.accept(a.id).await.unwrap();

    assert!(app.members.remove(student.id, project.id).await.unwrap());
    assert!(app.members.list_by_project(project.id).await.unwrap().is_empty());

    // The application record is preserved
    let application = app.applications.get(a.id).await.unwrap().unwrap();
    assert_eq!(application.status, ApplicationStatus::Accepted);
}

#[tokio::test]
async fn test_concurrent_accepts_never_oversubscribe() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db = Database::new(labmatch_core::storage::DatabaseConfig::with_path(
        dir.path().join("labmatch.db"),
    ))
    .await
    .expect("Failed to create database");
    let pool = db.pool().clone();

    let users = UserRepository::new(pool.clone());
    let projects = ProjectRepository::new(pool.clone());
    let coordinator = LifecycleCoordinator::new(pool.clone());

    let prof = User::new("Prof", "prof@example.edu");
    users.save(&prof).await.unwrap();
    let project = Project::new("Contended", prof.id, Difficulty::Intermediate, 10, 2);
    projects.save(&project).await.unwrap();

    let mut application_ids = Vec::new();
    for i in 0..5 {
        let student = User::new(format!("S{}", i), format!("s{}@example.edu", i));
        users.save(&student).await.unwrap();
        let a = coordinator.apply(student.id, project.id).await.unwrap();
        application_ids.push(a.id);
    }

    // Fire all five accepts at once; whatever the interleaving, the seat
    // count must hold
    let mut handles = Vec::new();
    for id in application_ids {
        let coordinator = coordinator.clone();
        handles.push(tokio::spawn(async move { coordinator.accept(id).await }));
    }
    for handle in handles {
        let _ = handle.await.expect("Task panicked");
    }

    let after = projects.get(project.id).await.unwrap().unwrap();
    assert!(after.selection_capacity >= 0);

    let members = MemberRepository::new(pool).list_by_project(project.id).await.unwrap();
    assert!(members.len() <= 2, "at most two seats, got {}", members.len());

    db.close().await;
}

#[tokio::test]
async fn test_concurrent_duplicate_applies_report_conflict() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db = Database::new(labmatch_core::storage::DatabaseConfig::with_path(
        dir.path().join("labmatch.db"),
    ))
    .await
    .expect("Failed to create database");
    let pool = db.pool().clone();

    let users = UserRepository::new(pool.clone());
    let coordinator = LifecycleCoordinator::new(pool.clone());

    let prof = User::new("Prof", "prof@example.edu");
    let student = User::new("Student", "student@example.edu");
    users.save(&prof).await.unwrap();
    users.save(&student).await.unwrap();
    let project = Project::new("Contended", prof.id, Difficulty::Beginner, 10, 2);
    ProjectRepository::new(pool.clone()).save(&project).await.unwrap();

    // Every losing apply must surface as a conflict, whether it lost at
    // the existence check or at the unique index
    let mut handles = Vec::new();
    for _ in 0..8 {
        let coordinator = coordinator.clone();
        let (applicant_id, project_id) = (student.id, project.id);
        handles.push(tokio::spawn(async move {
            coordinator.apply(applicant_id, project_id).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.expect("Task panicked") {
            Ok(_) => successes += 1,
            Err(e) => {
                assert!(
                    matches!(e, Error::DuplicateApplication { .. }),
                    "expected a conflict, got: {e}"
                );
                assert_eq!(e.code(), "conflict");
            }
        }
    }
    assert_eq!(successes, 1);

    // Exactly one row for the pair survives
    let application = ApplicationRepository::new(pool)
        .find(student.id, project.id)
        .await
        .unwrap();
    assert!(application.is_some());

    db.close().await;
}

#[tokio::test]
async fn test_database_reports_healthy_after_bootstrap() {
    let app = TestApp::new().await;
    app.db.health_check().await.expect("Health check failed");
    let status = app.db.migration_status().await.unwrap();
    assert!(!status.needs_migration);
}
