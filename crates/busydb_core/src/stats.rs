//! Store statistics.
//!
//! Operation counters shared by every table of a persistence service.
//!
//! ```rust
//! use busydb_core::{PersistenceService, Repository, User};
//!
//! let service = PersistenceService::new().unwrap();
//! let mut user = service.users().create();
//! user.login = "alice".into();
//! service.users().upsert_one(&mut user, &[User::by_login()]).unwrap();
//!
//! let stats = service.stats().snapshot();
//! assert_eq!(stats.upserts, 1);
//! ```

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Store statistics.
///
/// All counters are atomic and monotonically increasing. When the service
/// is configured without statistics every `record_*` call is a no-op.
#[derive(Debug)]
pub struct StoreStats {
    enabled: bool,
    /// Records returned to callers by reads.
    reads: AtomicU64,
    /// Records written by upserts.
    upserts: AtomicU64,
    /// Records removed by deletes.
    deletes: AtomicU64,
    /// Record ids issued by the seed table.
    ids_issued: AtomicU64,
    /// Upserts rejected by a uniqueness key.
    constraint_violations: AtomicU64,

    transactions_started: AtomicU64,
    transactions_committed: AtomicU64,
    transactions_rolled_back: AtomicU64,
}

impl Default for StoreStats {
    fn default() -> Self {
        Self::new(true)
    }
}

impl StoreStats {
    /// Creates a new stats instance.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            reads: AtomicU64::new(0),
            upserts: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            ids_issued: AtomicU64::new(0),
            constraint_violations: AtomicU64::new(0),
            transactions_started: AtomicU64::new(0),
            transactions_committed: AtomicU64::new(0),
            transactions_rolled_back: AtomicU64::new(0),
        }
    }

    fn bump(&self, counter: &AtomicU64, by: u64) {
        if self.enabled {
            counter.fetch_add(by, Ordering::Relaxed);
        }
    }

    // === Increment methods (internal use) ===

    pub(crate) fn record_reads(&self, records: usize) {
        self.bump(&self.reads, records as u64);
    }

    pub(crate) fn record_upserts(&self, records: usize) {
        self.bump(&self.upserts, records as u64);
    }

    pub(crate) fn record_deletes(&self, records: usize) {
        self.bump(&self.deletes, records as u64);
    }

    pub(crate) fn record_id_issued(&self) {
        self.bump(&self.ids_issued, 1);
    }

    pub(crate) fn record_constraint_violation(&self) {
        self.bump(&self.constraint_violations, 1);
    }

    pub(crate) fn record_transaction_start(&self) {
        self.bump(&self.transactions_started, 1);
    }

    pub(crate) fn record_transaction_commit(&self) {
        self.bump(&self.transactions_committed, 1);
    }

    pub(crate) fn record_transaction_rollback(&self) {
        self.bump(&self.transactions_rolled_back, 1);
    }

    // === Getter methods (public API) ===

    /// Returns whether counters are maintained.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the number of record copies handed out by reads.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Returns the number of records written by upserts.
    pub fn upserts(&self) -> u64 {
        self.upserts.load(Ordering::Relaxed)
    }

    /// Returns the number of records removed.
    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    /// Returns the number of record ids issued.
    pub fn ids_issued(&self) -> u64 {
        self.ids_issued.load(Ordering::Relaxed)
    }

    /// Returns the number of rejected upserts.
    pub fn constraint_violations(&self) -> u64 {
        self.constraint_violations.load(Ordering::Relaxed)
    }

    /// Returns the number of transactions opened, nested ones included.
    pub fn transactions_started(&self) -> u64 {
        self.transactions_started.load(Ordering::Relaxed)
    }

    /// Returns the number of committed transactions.
    pub fn transactions_committed(&self) -> u64 {
        self.transactions_committed.load(Ordering::Relaxed)
    }

    /// Returns the number of rolled back transactions.
    pub fn transactions_rolled_back(&self) -> u64 {
        self.transactions_rolled_back.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            reads: self.reads(),
            upserts: self.upserts(),
            deletes: self.deletes(),
            ids_issued: self.ids_issued(),
            constraint_violations: self.constraint_violations(),
            transactions_started: self.transactions_started(),
            transactions_committed: self.transactions_committed(),
            transactions_rolled_back: self.transactions_rolled_back(),
        }
    }
}

/// A point-in-time copy of [`StoreStats`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    /// Record copies handed out by reads.
    pub reads: u64,
    /// Records written by upserts.
    pub upserts: u64,
    /// Records removed by deletes.
    pub deletes: u64,
    /// Record ids issued.
    pub ids_issued: u64,
    /// Upserts rejected by a uniqueness key.
    pub constraint_violations: u64,
    /// Transactions opened.
    pub transactions_started: u64,
    /// Transactions committed.
    pub transactions_committed: u64,
    /// Transactions rolled back.
    pub transactions_rolled_back: u64,
}
