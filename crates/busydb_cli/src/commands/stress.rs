//! Stress command implementation.

use super::{CliError, OutputFormat};
use busydb_core::PersistenceService;
use busydb_testkit::{stress_concurrent_upserts, StressConfig, UpsertStressReport};
use std::sync::Arc;

/// Runs the stress command.
pub fn run(threads: usize, records: usize, format: OutputFormat) -> Result<(), CliError> {
    if threads == 0 {
        return Err(CliError::CheckFailed("at least one thread is required".to_owned()));
    }

    let service = Arc::new(PersistenceService::new()?);
    let config = StressConfig {
        records_per_thread: records,
        threads,
    };
    tracing::info!(threads, records, "starting concurrent upserts");

    let report = stress_concurrent_upserts(Arc::clone(&service), &config);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => print_report(&report),
    }

    if report.is_consistent() && report.result.failed_ops == 0 {
        Ok(())
    } else {
        Err(CliError::CheckFailed(format!(
            "{} upserts succeeded but {} distinct ids and {} records were observed",
            report.result.successful_ops, report.distinct_ids, report.stored_records
        )))
    }
}

fn print_report(report: &UpsertStressReport) {
    report.result.print_summary("Concurrent upserts");
    println!("Distinct ids: {}", report.distinct_ids);
    println!("Stored records: {}", report.stored_records);
    println!();
    if report.is_consistent() {
        println!("✓ Every upsert got its own id");
    } else {
        println!("✗ Id or record count mismatch");
    }
}
