//! Transaction scope.

use crate::error::{CoreError, CoreResult};
use crate::stats::StoreStats;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::cell::Cell;

/// Service-wide lock shared by all transactions.
///
/// The cell counts the scopes open on the owning thread.
pub(crate) type TransactionLock = ReentrantMutex<Cell<usize>>;

/// State of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is open.
    Active,
    /// `commit` was called.
    Committed,
    /// `rollback` was called.
    RolledBack,
}

/// An open transaction scope.
///
/// Opening the outermost scope on a thread takes the service-wide lock, so
/// no other thread can run a transaction until it is dropped. Scopes opened
/// while one is already open on the same thread are nested: they share the
/// outer scope's hold and the lock is released only when the outermost
/// scope is dropped, including during unwinding.
///
/// Isolation is advisory. Table operations do not require a transaction and
/// are not blocked by one, and neither `commit` nor `rollback` undoes or
/// defers any write: each upsert or delete takes effect immediately.
///
/// ```rust
/// use busydb_core::PersistenceService;
///
/// let service = PersistenceService::new().unwrap();
/// let mut outer = service.begin_transaction();
/// {
///     let inner = service.begin_transaction();
///     assert!(inner.is_nested());
/// }
/// outer.commit().unwrap();
/// ```
#[must_use = "dropping a transaction immediately releases its lock"]
pub struct Transaction<'a> {
    guard: ReentrantMutexGuard<'a, Cell<usize>>,
    nested: bool,
    state: TransactionState,
    stats: &'a StoreStats,
}

impl<'a> Transaction<'a> {
    /// Opens a scope, blocking until no other thread holds the lock.
    pub(crate) fn begin(lock: &'a TransactionLock, stats: &'a StoreStats) -> Self {
        let guard = lock.lock();
        let depth = guard.get();
        guard.set(depth + 1);

        stats.record_transaction_start();
        tracing::debug!(depth = depth + 1, nested = depth > 0, "transaction begin");

        Self {
            guard,
            nested: depth > 0,
            state: TransactionState::Active,
            stats,
        }
    }

    /// Returns true if an outer scope was already open on this thread.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.nested
    }

    /// Returns the number of scopes open on this thread, this one included.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.guard.get()
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Checks if the transaction is still open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Marks the transaction committed.
    ///
    /// Writes were already applied when they were made; this only closes the
    /// scope for further commit or rollback calls.
    pub fn commit(&mut self) -> CoreResult<()> {
        self.ensure_active()?;
        self.state = TransactionState::Committed;
        self.stats.record_transaction_commit();
        tracing::debug!(nested = self.nested, "transaction committed");
        Ok(())
    }

    /// Marks the transaction rolled back.
    ///
    /// No write made inside the scope is undone.
    pub fn rollback(&mut self) -> CoreResult<()> {
        self.ensure_active()?;
        self.state = TransactionState::RolledBack;
        self.stats.record_transaction_rollback();
        tracing::warn!(
            nested = self.nested,
            "transaction rolled back; writes made in its scope are kept"
        );
        Ok(())
    }

    fn ensure_active(&self) -> CoreResult<()> {
        match self.state {
            TransactionState::Active => Ok(()),
            TransactionState::Committed => Err(CoreError::invalid_operation(
                "transaction already committed",
            )),
            TransactionState::RolledBack => Err(CoreError::invalid_operation(
                "transaction already rolled back",
            )),
        }
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        let depth = self.guard.get();
        self.guard.set(depth.saturating_sub(1));
        if self.is_active() {
            tracing::trace!(nested = self.nested, "transaction scope ended without commit");
        }
    }
}

impl std::fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("nested", &self.nested)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    struct Shared {
        lock: TransactionLock,
        stats: StoreStats,
    }

    fn shared() -> Arc<Shared> {
        Arc::new(Shared {
            lock: ReentrantMutex::new(Cell::new(0)),
            stats: StoreStats::default(),
        })
    }

    #[test]
    fn new_transaction_is_active_and_outermost() {
        let s = shared();
        let txn = Transaction::begin(&s.lock, &s.stats);
        assert!(txn.is_active());
        assert!(!txn.is_nested());
        assert_eq!(txn.depth(), 1);
    }

    #[test]
    fn nested_scope_shares_the_lock() {
        let s = shared();
        let outer = Transaction::begin(&s.lock, &s.stats);
        {
            let inner = Transaction::begin(&s.lock, &s.stats);
            assert!(inner.is_nested());
            assert_eq!(inner.depth(), 2);
        }
        assert_eq!(outer.depth(), 1);
        drop(outer);

        let again = Transaction::begin(&s.lock, &s.stats);
        assert!(!again.is_nested());
    }

    #[test]
    fn cannot_commit_twice() {
        let s = shared();
        let mut txn = Transaction::begin(&s.lock, &s.stats);
        txn.commit().unwrap();
        assert_eq!(txn.state(), TransactionState::Committed);
        assert!(txn.commit().is_err());
        assert!(txn.rollback().is_err());
    }

    #[test]
    fn cannot_commit_after_rollback() {
        let s = shared();
        let mut txn = Transaction::begin(&s.lock, &s.stats);
        txn.rollback().unwrap();
        assert_eq!(txn.state(), TransactionState::RolledBack);
        assert!(txn.commit().is_err());
        assert_eq!(s.stats.transactions_rolled_back(), 1);
    }

    #[test]
    fn outer_scope_blocks_other_threads() {
        let s = shared();
        let entered = Arc::new(AtomicBool::new(false));

        let txn = Transaction::begin(&s.lock, &s.stats);
        let handle = {
            let s = Arc::clone(&s);
            let entered = Arc::clone(&entered);
            thread::spawn(move || {
                let other = Transaction::begin(&s.lock, &s.stats);
                entered.store(true, Ordering::SeqCst);
                assert!(!other.is_nested());
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!entered.load(Ordering::SeqCst));

        drop(txn);
        handle.join().unwrap();
        assert!(entered.load(Ordering::SeqCst));
    }

    #[test]
    fn unwinding_releases_the_lock() {
        let s = shared();
        let result = {
            let s = Arc::clone(&s);
            thread::spawn(move || {
                let _txn = Transaction::begin(&s.lock, &s.stats);
                panic!("failure inside transaction");
            })
            .join()
        };
        assert!(result.is_err());

        let txn = Transaction::begin(&s.lock, &s.stats);
        assert!(!txn.is_nested());
    }
}
