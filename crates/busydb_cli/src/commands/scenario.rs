//! Scenario command implementation.

use super::{CliError, OutputFormat};
use busydb_core::{IdSeed, PersistenceService, PersistenceState, Repository, StatsSnapshot, User};
use serde::Serialize;

/// What the scenario observed.
#[derive(Debug, Serialize)]
pub struct ScenarioReport {
    /// Users stored at the end.
    pub users: Vec<User>,
    /// Seed rows at the end.
    pub seeds: Vec<IdSeed>,
    /// Message of the rejected duplicate upsert.
    pub rejected: Option<String>,
    /// Operation counters.
    pub stats: StatsSnapshot,
}

/// Runs the scenario command.
pub fn run(format: OutputFormat) -> Result<(), CliError> {
    let service = PersistenceService::new()?;
    let report = execute(&service)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => print_report(&report),
    }

    Ok(())
}

/// Plays the login scenario against `service`.
///
/// Stores `alice`, tries a second `alice`, then edits the stored one.
pub fn execute(service: &PersistenceService) -> Result<ScenarioReport, CliError> {
    let users = service.users();
    let keys = [User::by_login()];

    let mut alice = users.create();
    alice.login = "alice".into();
    users.upsert_one(&mut alice, &keys)?;
    tracing::info!(id = ?alice.id(), "stored alice");

    let mut duplicate = users.create();
    duplicate.login = "alice".into();
    let rejected = match users.upsert_one(&mut duplicate, &keys) {
        Ok(()) => {
            return Err(CliError::CheckFailed(
                "duplicate login was accepted".to_owned(),
            ))
        }
        Err(err) if err.is_constraint_violation() => Some(err.to_string()),
        Err(err) => return Err(err.into()),
    };

    let mut stored = users
        .get_single(&|u| u.login == "alice")
        .ok_or_else(|| CliError::CheckFailed("alice is missing".to_owned()))?;
    stored.email = "a@x".into();
    users.upsert_one(&mut stored, &keys)?;

    if users.count_all() != 1 || stored.id() != alice.id() {
        return Err(CliError::CheckFailed(
            "edit did not update alice in place".to_owned(),
        ));
    }

    Ok(ScenarioReport {
        users: users.get_all(),
        seeds: service.seeds().get_all(),
        rejected,
        stats: service.stats().snapshot(),
    })
}

fn print_report(report: &ScenarioReport) {
    println!("Users");
    println!("=====");
    for user in &report.users {
        let id = user.id().map_or_else(|| "-".to_owned(), |id| id.to_string());
        println!("  {:<6} {:<12} {}", id, user.login, user.email);
    }
    println!();

    if let Some(rejected) = &report.rejected {
        println!("Rejected duplicate: {rejected}");
        println!();
    }

    println!("Id seeds");
    println!("========");
    for seed in &report.seeds {
        println!("  {:<18} last id {}", seed.table_name, seed.seed);
    }
    println!();

    println!("Statistics");
    println!("==========");
    println!("  Upserts:               {}", report.stats.upserts);
    println!("  Reads:                 {}", report.stats.reads);
    println!("  Ids issued:            {}", report.stats.ids_issued);
    println!("  Constraint violations: {}", report.stats.constraint_violations);
}
