//! Persistence service facade.

use crate::config::Config;
use crate::error::CoreResult;
use crate::seed::SeedTable;
use crate::stats::StoreStats;
use crate::table::Table;
use crate::tables::{AccessToken, Category, Password, User, WorkItem, WorkItemCategory};
use crate::transaction::{Transaction, TransactionLock};
use parking_lot::ReentrantMutex;
use std::cell::Cell;
use std::sync::Arc;

/// The in-memory store of the BusyList application.
///
/// `PersistenceService` owns the seed table and one [`Table`] per entity
/// kind. All tables are created when the service is built and live as long
/// as it does.
///
/// # Example
///
/// ```rust
/// use busydb_core::{PersistenceService, PersistenceState, RecordId, Repository, User};
///
/// let service = PersistenceService::new()?;
///
/// service.transaction(|_txn| {
///     let mut alice = service.users().create();
///     alice.login = "alice".into();
///     service.users().upsert_one(&mut alice, &[User::by_login()])?;
///     assert_eq!(alice.id(), Some(RecordId::new(1)));
///     Ok(())
/// })?;
///
/// assert_eq!(service.users().count_all(), 1);
/// # Ok::<(), busydb_core::CoreError>(())
/// ```
pub struct PersistenceService {
    /// Configuration.
    config: Config,
    /// Shared operation counters.
    stats: Arc<StoreStats>,
    /// Id seeds of every kind.
    seeds: Arc<SeedTable>,
    users: Table<User>,
    passwords: Table<Password>,
    access_tokens: Table<AccessToken>,
    work_items: Table<WorkItem>,
    categories: Table<Category>,
    work_item_categories: Table<WorkItemCategory>,
    /// Service-wide transaction lock.
    txn_lock: TransactionLock,
}

impl PersistenceService {
    /// Creates a service with the default configuration.
    pub fn new() -> CoreResult<Self> {
        Self::with_config(Config::default())
    }

    /// Creates a service with a custom configuration.
    ///
    /// Bootstraps the seed table, then registers one seed row per table.
    pub fn with_config(config: Config) -> CoreResult<Self> {
        let stats = Arc::new(StoreStats::new(config.collect_stats));
        let seeds = SeedTable::bootstrap(&config, Arc::clone(&stats))?;

        let service = Self {
            users: Table::register(&seeds, Arc::clone(&stats))?,
            passwords: Table::register(&seeds, Arc::clone(&stats))?,
            access_tokens: Table::register(&seeds, Arc::clone(&stats))?,
            work_items: Table::register(&seeds, Arc::clone(&stats))?,
            categories: Table::register(&seeds, Arc::clone(&stats))?,
            work_item_categories: Table::register(&seeds, Arc::clone(&stats))?,
            txn_lock: ReentrantMutex::new(Cell::new(0)),
            config,
            stats,
            seeds,
        };

        tracing::debug!(kinds = service.seeds.len(), "persistence service ready");
        Ok(service)
    }

    /// Returns the user table.
    #[must_use]
    pub fn users(&self) -> &Table<User> {
        &self.users
    }

    /// Returns the password table.
    #[must_use]
    pub fn passwords(&self) -> &Table<Password> {
        &self.passwords
    }

    /// Returns the access token table.
    #[must_use]
    pub fn access_tokens(&self) -> &Table<AccessToken> {
        &self.access_tokens
    }

    /// Returns the work item table.
    #[must_use]
    pub fn work_items(&self) -> &Table<WorkItem> {
        &self.work_items
    }

    /// Returns the category table.
    #[must_use]
    pub fn categories(&self) -> &Table<Category> {
        &self.categories
    }

    /// Returns the work item to category link table.
    #[must_use]
    pub fn work_item_categories(&self) -> &Table<WorkItemCategory> {
        &self.work_item_categories
    }

    /// Returns the seed table.
    #[must_use]
    pub fn seeds(&self) -> &SeedTable {
        &self.seeds
    }

    /// Opens a transaction scope.
    ///
    /// Blocks while another thread has a transaction open. Opening a scope
    /// on a thread that already has one open returns a nested scope at once.
    pub fn begin_transaction(&self) -> Transaction<'_> {
        Transaction::begin(&self.txn_lock, &self.stats)
    }

    /// Runs `f` inside a transaction scope.
    ///
    /// The scope is committed when `f` returns `Ok` and rolled back when it
    /// returns `Err`, unless `f` already finished it. Writes made by `f` are
    /// applied as they happen either way.
    pub fn transaction<F, T>(&self, f: F) -> CoreResult<T>
    where
        F: FnOnce(&mut Transaction<'_>) -> CoreResult<T>,
    {
        let mut txn = self.begin_transaction();
        match f(&mut txn) {
            Ok(value) => {
                if txn.is_active() {
                    txn.commit()?;
                }
                Ok(value)
            }
            Err(err) => {
                if txn.is_active() {
                    txn.rollback()?;
                }
                Err(err)
            }
        }
    }

    /// Returns the operation counters.
    #[must_use]
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the registered entity kinds, sorted.
    #[must_use]
    pub fn kinds(&self) -> Vec<String> {
        self.seeds.kinds()
    }
}

impl std::fmt::Debug for PersistenceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceService")
            .field("kinds", &self.kinds())
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{PersistenceState, RecordId};
    use crate::error::CoreError;
    use crate::stats::StatsSnapshot;
    use crate::table::Repository;
    use crate::transaction::TransactionState;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    fn user(login: &str, email: &str) -> User {
        User {
            login: login.into(),
            email: email.into(),
            ..User::default()
        }
    }

    #[test]
    fn every_kind_is_registered() {
        let service = PersistenceService::new().unwrap();
        assert_eq!(
            service.kinds(),
            vec![
                "AccessToken",
                "Category",
                "IdSeed",
                "Password",
                "User",
                "WorkItem",
                "WorkItemCategory"
            ]
        );
        assert_eq!(service.seeds().len(), 7);
        assert_eq!(service.seeds().current("IdSeed"), Some(7));
    }

    #[test]
    fn login_scenario() {
        let service = PersistenceService::new().unwrap();
        let users = service.users();
        let keys = [User::by_login()];

        let mut alice = users.create();
        alice.login = "alice".into();
        users.upsert_one(&mut alice, &keys).unwrap();
        assert_eq!(alice.id(), Some(RecordId::new(1)));

        let mut impostor = user("alice", "");
        let err = users.upsert_one(&mut impostor, &keys).unwrap_err();
        assert!(err.is_constraint_violation());
        assert_eq!(users.count_all(), 1);

        let mut stored = users.get_single(&|u| u.login == "alice").unwrap();
        stored.email = "a@x".into();
        users.upsert_one(&mut stored, &keys).unwrap();

        let reloaded = users.get_by_id(RecordId::new(1)).unwrap();
        assert_eq!(reloaded.email, "a@x");
        assert_eq!(users.count_all(), 1);
    }

    #[test]
    fn kinds_have_independent_counters() {
        let service = PersistenceService::new().unwrap();

        let mut alice = user("alice", "alice@example.com");
        service.users().upsert_one(&mut alice, &[]).unwrap();

        let mut item = service.work_items().create();
        item.title = "buy milk".into();
        item.owning_login = "alice".into();
        service.work_items().upsert_one(&mut item, &[]).unwrap();

        assert_eq!(alice.id(), Some(RecordId::new(1)));
        assert_eq!(item.id(), Some(RecordId::new(1)));
        assert_eq!(service.seeds().current("User"), Some(1));
        assert_eq!(service.seeds().current("Category"), Some(0));
    }

    #[test]
    fn composite_key_across_tables() {
        let service = PersistenceService::new().unwrap();
        let categories = service.categories();

        let mut home = Category {
            owning_user_name: "alice".into(),
            name: "home".into(),
            ..Category::default()
        };
        categories
            .upsert_one(&mut home, &[Category::by_owner_and_name()])
            .unwrap();

        let mut other_owner = Category {
            owning_user_name: "bob".into(),
            name: "home".into(),
            ..Category::default()
        };
        categories
            .upsert_one(&mut other_owner, &[Category::by_owner_and_name()])
            .unwrap();

        let mut duplicate = Category {
            owning_user_name: "alice".into(),
            name: "home".into(),
            ..Category::default()
        };
        let err = categories
            .upsert_one(&mut duplicate, &[Category::by_owner_and_name()])
            .unwrap_err();
        assert!(matches!(err, CoreError::UniqueConstraintViolated { .. }));
        assert_eq!(categories.count_all(), 2);
    }

    #[test]
    fn transaction_commits_on_ok() {
        let service = PersistenceService::new().unwrap();

        let id = service
            .transaction(|txn| {
                assert!(!txn.is_nested());
                let mut alice = user("alice", "alice@example.com");
                service.users().upsert_one(&mut alice, &[User::by_login()])?;
                Ok(alice.id())
            })
            .unwrap();

        assert_eq!(id, Some(RecordId::new(1)));
        assert_eq!(service.stats().transactions_committed(), 1);
    }

    #[test]
    fn transaction_rolls_back_on_err_and_keeps_writes() {
        let service = PersistenceService::new().unwrap();
        let keys = [User::by_login()];

        let result: CoreResult<()> = service.transaction(|_txn| {
            let mut alice = user("alice", "");
            service.users().upsert_one(&mut alice, &keys)?;
            let mut again = user("alice", "");
            service.users().upsert_one(&mut again, &keys)?;
            Ok(())
        });

        assert!(result.unwrap_err().is_constraint_violation());
        assert_eq!(service.users().count_all(), 1);
        assert_eq!(service.stats().transactions_rolled_back(), 1);
        assert_eq!(service.stats().transactions_committed(), 0);
    }

    #[test]
    fn closure_may_finish_the_transaction_itself() {
        let service = PersistenceService::new().unwrap();

        service
            .transaction(|txn| {
                txn.rollback()?;
                assert_eq!(txn.state(), TransactionState::RolledBack);
                Ok(())
            })
            .unwrap();

        assert_eq!(service.stats().transactions_committed(), 0);
        assert_eq!(service.stats().transactions_rolled_back(), 1);
    }

    #[test]
    fn nested_transaction_through_the_service() {
        let service = PersistenceService::new().unwrap();

        service
            .transaction(|outer| {
                assert!(!outer.is_nested());
                service.transaction(|inner| {
                    assert!(inner.is_nested());
                    Ok(())
                })
            })
            .unwrap();

        assert_eq!(service.stats().transactions_started(), 2);
        assert_eq!(service.stats().transactions_committed(), 2);
    }

    #[test]
    fn open_transaction_blocks_other_threads_only() {
        let service = Arc::new(PersistenceService::new().unwrap());
        let entered = Arc::new(AtomicBool::new(false));

        let txn = service.begin_transaction();
        let handle = {
            let service = Arc::clone(&service);
            let entered = Arc::clone(&entered);
            thread::spawn(move || {
                let mut bob = user("bob", "bob@example.com");
                service.users().upsert_one(&mut bob, &[]).unwrap();
                let _other = service.begin_transaction();
                entered.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!entered.load(Ordering::SeqCst));
        assert_eq!(service.users().count_all(), 1);

        drop(txn);
        handle.join().unwrap();
        assert!(entered.load(Ordering::SeqCst));
    }

    #[test]
    fn fresh_service_reports_zero_counters() {
        let service = PersistenceService::new().unwrap();
        assert_eq!(service.stats().snapshot(), StatsSnapshot::default());

        let mut alice = user("alice", "");
        service.users().upsert_one(&mut alice, &[User::by_login()]).unwrap();

        let stats = service.stats().snapshot();
        assert_eq!(stats.upserts, 1);
        assert_eq!(stats.ids_issued, 1);
        assert_eq!(stats.reads, 0);
    }

    #[test]
    fn exhausted_seed_ids_fail_construction() {
        let config = Config::new().bootstrap_id(RecordId::new(u64::MAX));
        let err = PersistenceService::with_config(config).unwrap_err();
        assert!(matches!(err, CoreError::InvalidOperation { .. }));
    }

    #[test]
    fn stats_can_be_disabled() {
        let service = PersistenceService::with_config(Config::new().collect_stats(false)).unwrap();
        let mut alice = user("alice", "");
        service.users().upsert_one(&mut alice, &[]).unwrap();

        assert!(!service.stats().is_enabled());
        assert_eq!(service.stats().upserts(), 0);
    }

    #[test]
    fn custom_bootstrap_id_shifts_seed_rows_only() {
        let config = Config::new().bootstrap_id(RecordId::new(100));
        let service = PersistenceService::with_config(config).unwrap();

        let seeds = service.seeds().get_all();
        assert_eq!(seeds[0].id(), Some(RecordId::new(100)));
        assert_eq!(seeds[1].id(), Some(RecordId::new(101)));

        let mut alice = user("alice", "");
        service.users().upsert_one(&mut alice, &[]).unwrap();
        assert_eq!(alice.id(), Some(RecordId::new(1)));
    }
}
