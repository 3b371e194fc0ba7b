//! Labmatch CLI - research project application coordination

use clap::{Parser, Subcommand};
use labmatch_core::domain::{Difficulty, Project, ProjectStatus, User};
use labmatch_core::lifecycle::LifecycleCoordinator;
use labmatch_core::repository::{
    ApplicationRepository, MemberRepository, ProjectRepository, UserRepository,
};
use labmatch_core::storage::{Database, DatabaseConfig};
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "labmatch")]
#[command(author, version, about = "Research project application coordination", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database file path (defaults to the per-user config directory)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, PartialEq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage users
    Users {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Manage projects
    Projects {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Submit an application to a project
    Apply {
        /// Applicant user ID
        applicant: Uuid,
        /// Project ID
        project: Uuid,
    },

    /// Withdraw an application
    Withdraw {
        /// Applicant user ID
        applicant: Uuid,
        /// Project ID
        project: Uuid,
    },

    /// Accept a pending application
    Accept {
        /// Application ID
        application: Uuid,
    },

    /// Reject a pending application
    Reject {
        /// Application ID
        application: Uuid,
    },

    /// Resolve a batch of applications in one command
    Resolve {
        /// Application IDs to accept
        #[arg(long = "accept", value_name = "ID")]
        accepted: Vec<Uuid>,
        /// Application IDs to reject
        #[arg(long = "reject", value_name = "ID")]
        rejected: Vec<Uuid>,
    },

    /// Close a project and apply rating updates
    Close {
        /// Project ID
        project: Uuid,
        /// Contributor scores as USER_ID=SCORE pairs
        #[arg(long = "score", value_name = "USER_ID=SCORE")]
        scores: Vec<String>,
    },

    /// Run health check
    Doctor,
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        name: String,
        email: String,
    },
    /// List all users, highest rating first
    List,
    /// Show user details
    Show { id: Uuid },
    /// List a user's applications
    Applications { id: Uuid },
}

#[derive(Subcommand)]
enum ProjectAction {
    /// Create a new project
    Create {
        title: String,
        /// Authoring professor's user ID
        #[arg(long)]
        author: Uuid,
        /// Difficulty tier (beginner, intermediate, advanced)
        #[arg(short, long, default_value = "intermediate")]
        difficulty: String,
        /// Applications the project will review
        #[arg(long, default_value_t = 10)]
        applicant_capacity: i64,
        /// Seats on the team
        #[arg(long, default_value_t = 3)]
        selection_capacity: i64,
    },
    /// List projects
    List {
        /// Filter by status (open, in_progress, closed)
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Show project details
    Show { id: Uuid },
    /// Move an open project to in-progress
    Start { id: Uuid },
    /// List a project's applications
    Applications { id: Uuid },
    /// List a project's team members
    Members { id: Uuid },
    /// Remove a member from a project's team
    RemoveMember {
        id: Uuid,
        /// Member user ID
        #[arg(long)]
        user: Uuid,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("labmatch_core=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.database {
        Some(path) => DatabaseConfig::with_path(path),
        None => DatabaseConfig::default(),
    };
    let db = Database::new(config).await?;

    let result = run(&cli, &db).await;
    db.close().await;

    // Domain outcomes get their stable code; storage error text stays out
    // of the user-facing message
    if let Err(e) = result {
        match e.downcast_ref::<labmatch_core::Error>() {
            Some(domain) if domain.is_domain() => {
                anyhow::bail!("{} ({})", domain, domain.code())
            }
            _ => return Err(e),
        }
    }
    Ok(())
}

async fn run(cli: &Cli, db: &Database) -> anyhow::Result<()> {
    let coordinator = LifecycleCoordinator::new(db.pool().clone());

    match &cli.command {
        Commands::Users { action } => cmd_users(db, action, cli).await,
        Commands::Projects { action } => cmd_projects(db, action, cli).await,

        Commands::Apply { applicant, project } => {
            let application = coordinator.apply(*applicant, *project).await?;
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&application)?);
            } else if !cli.quiet {
                println!("Application submitted: {}", application.id);
            }
            Ok(())
        }

        Commands::Withdraw { applicant, project } => {
            coordinator.withdraw(*applicant, *project).await?;
            if !cli.quiet {
                println!("Application withdrawn.");
            }
            Ok(())
        }

        Commands::Accept { application } => {
            let member = coordinator.accept(*application).await?;
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&member)?);
            } else if !cli.quiet {
                println!(
                    "Application accepted; user {} joined project {}",
                    member.user_id, member.project_id
                );
            }
            Ok(())
        }

        Commands::Reject { application } => {
            coordinator.reject(*application).await?;
            if !cli.quiet {
                println!("Application rejected.");
            }
            Ok(())
        }

        Commands::Resolve { accepted, rejected } => {
            let outcome = coordinator.bulk_resolve(accepted, rejected).await?;
            if !cli.quiet {
                println!(
                    "Resolved: {} accepted, {} rejected, {} failed",
                    outcome.accepted.len(),
                    outcome.rejected.len(),
                    outcome.failures.len()
                );
                for (id, error) in &outcome.failures {
                    println!("  {} failed: {} ({})", id, error, error.code());
                }
            }
            Ok(())
        }

        Commands::Close { project, scores } => {
            let scores = parse_scores(scores)?;
            let outcome = coordinator.close_project(*project, &scores).await?;
            if !cli.quiet {
                println!("Project {} closed.", outcome.project_id);
                if !outcome.updated_ratings.is_empty() {
                    println!("Updated ratings:");
                    for (user_id, rating) in &outcome.updated_ratings {
                        println!("  {} -> {:.2}", user_id, rating);
                    }
                }
                for user_id in &outcome.skipped {
                    println!("  {} skipped (no such user)", user_id);
                }
            }
            Ok(())
        }

        Commands::Doctor => cmd_doctor(db, cli.quiet).await,
    }
}

/// Parse `USER_ID=SCORE` pairs from the command line
fn parse_scores(raw: &[String]) -> anyhow::Result<HashMap<Uuid, f64>> {
    let mut scores = HashMap::with_capacity(raw.len());
    for pair in raw {
        let (user, score) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Expected USER_ID=SCORE, got '{}'", pair))?;
        let user: Uuid = user
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid user ID '{}': {}", user, e))?;
        let score: f64 = score
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid score '{}': {}", score, e))?;
        scores.insert(user, score);
    }
    Ok(scores)
}

async fn cmd_users(db: &Database, action: &UserAction, cli: &Cli) -> anyhow::Result<()> {
    let users = UserRepository::new(db.pool().clone());

    match action {
        UserAction::Create { name, email } => {
            let user = User::new(name, email);
            users.save(&user).await?;
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&user)?);
            } else if !cli.quiet {
                println!("User created: {}", user.id);
            }
        }
        UserAction::List => {
            let all = users.list().await?;
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&all)?);
            } else if all.is_empty() {
                if !cli.quiet {
                    println!("No users found.");
                }
            } else {
                for u in all {
                    println!("{}  {:>8.1}  {} <{}>", u.id, u.rating, u.name, u.email);
                }
            }
        }
        UserAction::Show { id } => {
            let user = users
                .get(*id)
                .await?
                .ok_or(labmatch_core::Error::UserNotFound(*id))?;
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&user)?);
            } else {
                println!("User: {}", user.name);
                println!("  ID: {}", user.id);
                println!("  Email: {}", user.email);
                println!("  Rating: {:.2}", user.rating);
                println!("  Created: {}", user.created_at.format("%Y-%m-%d %H:%M:%S"));
            }
        }
        UserAction::Applications { id } => {
            let applications = ApplicationRepository::new(db.pool().clone())
                .list_by_applicant(*id)
                .await?;
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&applications)?);
            } else if applications.is_empty() {
                if !cli.quiet {
                    println!("No applications found.");
                }
            } else {
                for a in applications {
                    println!("{}  {:>9}  project {}", a.id, a.status.as_str(), a.project_id);
                }
            }
        }
    }
    Ok(())
}

async fn cmd_projects(db: &Database, action: &ProjectAction, cli: &Cli) -> anyhow::Result<()> {
    let projects = ProjectRepository::new(db.pool().clone());

    match action {
        ProjectAction::Create {
            title,
            author,
            difficulty,
            applicant_capacity,
            selection_capacity,
        } => {
            let difficulty = Difficulty::from_str(difficulty)
                .ok_or_else(|| anyhow::anyhow!("Unknown difficulty '{}'", difficulty))?;
            if *applicant_capacity < 0 || *selection_capacity < 0 {
                anyhow::bail!("Capacities must be non-negative");
            }
            let project = Project::new(
                title,
                *author,
                difficulty,
                *applicant_capacity,
                *selection_capacity,
            );
            projects.save(&project).await?;
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&project)?);
            } else if !cli.quiet {
                println!("Project created: {}", project.id);
            }
        }
        ProjectAction::List { status } => {
            let all = match status {
                Some(s) => {
                    let status = ProjectStatus::from_str(s)
                        .ok_or_else(|| anyhow::anyhow!("Unknown status '{}'", s))?;
                    projects.list_by_status(status).await?
                }
                None => projects.list().await?,
            };
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&all)?);
            } else if all.is_empty() {
                if !cli.quiet {
                    println!("No projects found.");
                }
            } else {
                for p in all {
                    println!(
                        "{}  {:>11}  {:>12}  seats {}  {}",
                        p.id,
                        p.status.as_str(),
                        p.difficulty.as_str(),
                        p.selection_capacity,
                        p.title
                    );
                }
            }
        }
        ProjectAction::Show { id } => {
            let project = projects
                .get(*id)
                .await?
                .ok_or(labmatch_core::Error::ProjectNotFound(*id))?;
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&project)?);
            } else {
                let pending = ApplicationRepository::new(db.pool().clone())
                    .count_pending(project.id)
                    .await?;
                println!("Project: {}", project.title);
                println!("  ID: {}", project.id);
                println!("  Author: {}", project.author_id);
                println!("  Difficulty: {}", project.difficulty);
                println!("  Status: {}", project.status);
                println!("  Applicant capacity: {}", project.applicant_capacity);
                println!("  Selection capacity: {}", project.selection_capacity);
                println!("  Pending applications: {}", pending);
                println!("  Created: {}", project.created_at.format("%Y-%m-%d %H:%M:%S"));
            }
        }
        ProjectAction::Start { id } => {
            if projects.start(*id).await? {
                if !cli.quiet {
                    println!("Project {} is now in progress.", id);
                }
            } else {
                anyhow::bail!("Project '{}' is not open", id);
            }
        }
        ProjectAction::Applications { id } => {
            let applications = ApplicationRepository::new(db.pool().clone())
                .list_by_project(*id)
                .await?;
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&applications)?);
            } else if applications.is_empty() {
                if !cli.quiet {
                    println!("No applications found.");
                }
            } else {
                for a in applications {
                    println!("{}  {:>9}  applicant {}", a.id, a.status.as_str(), a.applicant_id);
                }
            }
        }
        ProjectAction::Members { id } => {
            let members = MemberRepository::new(db.pool().clone()).list_by_project(*id).await?;
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&members)?);
            } else if members.is_empty() {
                if !cli.quiet {
                    println!("No members found.");
                }
            } else {
                for m in members {
                    println!(
                        "{}  joined {}",
                        m.user_id,
                        m.joined_at.format("%Y-%m-%d %H:%M:%S")
                    );
                }
            }
        }
        ProjectAction::RemoveMember { id, user } => {
            let removed = MemberRepository::new(db.pool().clone()).remove(*user, *id).await?;
            if removed {
                if !cli.quiet {
                    println!("Member {} removed from project {}.", user, id);
                }
            } else {
                anyhow::bail!("User '{}' is not a member of project '{}'", user, id);
            }
        }
    }
    Ok(())
}

async fn cmd_doctor(db: &Database, quiet: bool) -> anyhow::Result<()> {
    if !quiet {
        println!("Labmatch Health Check");
        println!("=====================");
        println!();
    }

    let mut all_ok = true;

    match db.health_check().await {
        Ok(()) => {
            if !quiet {
                println!("[OK] Database: Connected");
                println!("     Path: {}", db.path().display());
            }
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Database: Health check failed - {}", e);
            }
        }
    }

    match db.migration_status().await {
        Ok(status) => {
            if status.needs_migration {
                all_ok = false;
                if !quiet {
                    println!(
                        "[!!] Database: Migrations pending (v{} -> v{})",
                        status.current_version, status.target_version
                    );
                }
            } else if !quiet {
                println!("[OK] Database: Schema v{}", status.current_version);
            }
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Database: Migration check failed - {}", e);
            }
        }
    }

    if !quiet {
        println!();
        if all_ok {
            println!("All checks passed!");
        } else {
            println!("Some checks failed. See above for details.");
        }
    }

    if all_ok {
        Ok(())
    } else {
        anyhow::bail!("Health check failed")
    }
}
