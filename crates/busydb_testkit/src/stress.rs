//! Stress tests for BusyDB.
//!
//! These runners drive a shared service from several threads and report
//! what they observed, so callers can check the id and uniqueness
//! guarantees under contention.

use busydb_core::{CoreError, PersistenceService, PersistenceState, RecordId, Repository, User};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone, Serialize)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of records each thread upserts.
    pub records_per_thread: usize,
    /// Number of concurrent threads.
    pub threads: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            records_per_thread: 1_000,
            threads: 4,
        }
    }
}

/// Outcome of a concurrent upsert run.
#[derive(Debug, Clone, Serialize)]
pub struct UpsertStressReport {
    /// Operation counts and timing.
    pub result: StressTestResult,
    /// Number of distinct ids handed back to the threads.
    pub distinct_ids: usize,
    /// Records added to the table by the run.
    pub stored_records: usize,
}

impl UpsertStressReport {
    /// Returns true if every successful upsert got its own id and stored
    /// exactly one record.
    pub fn is_consistent(&self) -> bool {
        self.distinct_ids == self.result.successful_ops
            && self.stored_records == self.result.successful_ops
    }
}

fn stress_user(thread: usize, index: usize) -> User {
    User {
        login: format!("t{thread}_u{index}"),
        email: format!("t{thread}_u{index}@example.com"),
        ..User::default()
    }
}

/// Upserts distinct users from several threads at once.
///
/// Every upsert is checked against the login and email keys. All of them
/// are expected to succeed with pairwise distinct ids.
pub fn stress_concurrent_upserts(
    service: Arc<PersistenceService>,
    config: &StressConfig,
) -> UpsertStressReport {
    let before = service.users().count_all();
    let failed = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let service = Arc::clone(&service);
            let failed = Arc::clone(&failed);
            let records = config.records_per_thread;

            thread::spawn(move || {
                let keys = [User::by_login(), User::by_email()];
                let mut ids = Vec::with_capacity(records);
                for i in 0..records {
                    let mut user = stress_user(t, i);
                    match service.users().upsert_one(&mut user, &keys) {
                        Ok(()) => ids.extend(user.id()),
                        Err(_) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
                ids
            })
        })
        .collect();

    let mut all_ids: Vec<RecordId> = Vec::new();
    for handle in handles {
        all_ids.extend(handle.join().expect("Thread panicked"));
    }
    let duration = start.elapsed();

    let distinct: HashSet<RecordId> = all_ids.iter().copied().collect();
    UpsertStressReport {
        result: StressTestResult::new(
            all_ids.len(),
            failed.load(Ordering::Relaxed),
            duration,
        ),
        distinct_ids: distinct.len(),
        stored_records: service.users().count_all().saturating_sub(before),
    }
}

/// Has every thread try to upsert the same logins.
///
/// Exactly one upsert per login is expected to win; every other attempt
/// fails with a constraint violation.
pub fn stress_contended_logins(
    service: Arc<PersistenceService>,
    logins: &[String],
    threads: usize,
) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let logins: Arc<Vec<String>> = Arc::new(logins.to_vec());
    let start = Instant::now();

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let service = Arc::clone(&service);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let logins = Arc::clone(&logins);

            thread::spawn(move || {
                let keys = [User::by_login()];
                for login in logins.iter() {
                    let mut user = User {
                        login: login.clone(),
                        ..User::default()
                    };
                    match service.users().upsert_one(&mut user, &keys) {
                        Ok(()) => {
                            successful.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(_) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Runs transactions where every other one fails after writing.
///
/// Transactions are advisory, so the writes of failed transactions stay in
/// place: afterwards the table holds one user per operation.
pub fn stress_transaction_aborts(service: &PersistenceService, operations: usize) -> StressTestResult {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..operations {
        let should_fail = i % 2 == 0;

        let result = service.transaction(|_txn| {
            let mut user = stress_user(0, i);
            service.users().upsert_one(&mut user, &[User::by_login()])?;

            if should_fail {
                Err(CoreError::invalid_operation("intentional"))
            } else {
                Ok(())
            }
        });

        match result {
            Ok(()) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}
