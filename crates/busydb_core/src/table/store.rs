//! Generic in-memory table.

use crate::entity::{PersistenceState, RecordId};
use crate::error::{CoreError, CoreResult};
use crate::seed::{IdGenerator, SeedTable};
use crate::stats::StoreStats;
use crate::table::constraint::check_uniqueness;
use crate::table::{Repository, UniqueKey};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

/// The records of one entity kind, keyed by id.
///
/// A table owns its records; callers only ever see copies. All reads and
/// writes go through the table lock, so upserts on one table are
/// linearizable. Ids come from the seed table and are drawn before the
/// lock is taken.
///
/// Reads take the lock recursively and `delete_where` evaluates its
/// predicate under a shared guard, so predicates may read the table they
/// filter. They must not write to it.
pub struct Table<S: PersistenceState> {
    /// Id -> record. Every key equals the id of its record.
    records: RwLock<BTreeMap<RecordId, S>>,
    /// Seed table issuing ids for this kind.
    ids: Weak<dyn IdGenerator>,
    /// Shared operation counters.
    stats: Arc<StoreStats>,
}

impl<S: PersistenceState> Table<S> {
    /// Creates a table drawing ids from `ids`, without registering a seed.
    pub(crate) fn new(ids: Weak<dyn IdGenerator>, stats: Arc<StoreStats>) -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            ids,
            stats,
        }
    }

    /// Registers a seed row for `S::KIND` and creates the table.
    pub(crate) fn register(seeds: &Arc<SeedTable>, stats: Arc<StoreStats>) -> CoreResult<Self> {
        seeds.register(S::KIND)?;
        let seeds: Weak<SeedTable> = Arc::downgrade(seeds);
        let ids: Weak<dyn IdGenerator> = seeds;
        tracing::debug!(kind = S::KIND, "table registered");
        Ok(Self::new(ids, stats))
    }

    /// Returns the entity kind stored in this table.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        S::KIND
    }

    /// Inserts a record under `id` without id assignment or checks.
    ///
    /// Only the seed bootstrap uses this.
    pub(crate) fn insert_raw(&self, id: RecordId, record: S) {
        self.records.write().insert(id, record);
    }

    /// Mutates the stored record in place and returns what `f` returns.
    pub(crate) fn update_in_place<R>(&self, id: RecordId, f: impl FnOnce(&mut S) -> R) -> Option<R> {
        self.records.write().get_mut(&id).map(f)
    }
}

impl<S: PersistenceState> Repository<S> for Table<S> {
    fn create(&self) -> S {
        S::default()
    }

    fn get(&self, predicate: &dyn Fn(&S) -> bool) -> Vec<S> {
        let records = self.records.read_recursive();
        let found: Vec<S> = records
            .values()
            .filter(|record| predicate(*record))
            .cloned()
            .collect();
        self.stats.record_reads(found.len());
        found
    }

    fn get_all(&self) -> Vec<S> {
        let found: Vec<S> = self.records.read_recursive().values().cloned().collect();
        self.stats.record_reads(found.len());
        found
    }

    fn get_single(&self, predicate: &dyn Fn(&S) -> bool) -> Option<S> {
        let found = self
            .records
            .read_recursive()
            .values()
            .find(|record| predicate(*record))
            .cloned();
        self.stats.record_reads(usize::from(found.is_some()));
        found
    }

    fn get_by_id(&self, id: RecordId) -> Option<S> {
        let found = self.records.read_recursive().get(&id).cloned();
        self.stats.record_reads(usize::from(found.is_some()));
        found
    }

    fn count(&self, predicate: &dyn Fn(&S) -> bool) -> usize {
        self.records
            .read_recursive()
            .values()
            .filter(|record| predicate(*record))
            .count()
    }

    fn count_all(&self) -> usize {
        self.records.read_recursive().len()
    }

    fn ensure_id_is_generated(&self, item: &mut S) -> CoreResult<RecordId> {
        if let Some(id) = item.id() {
            return Ok(id);
        }
        let ids = self.ids.upgrade().ok_or(CoreError::ServiceDropped)?;
        let id = ids.next_id_for(S::KIND)?;
        item.identity_mut().assign(id);
        Ok(id)
    }

    fn upsert(&self, items: &mut [S], unique_keys: &[UniqueKey<S>]) -> CoreResult<()> {
        if items.is_empty() {
            return Ok(());
        }

        // Snapshot: the table never aliases caller-owned states.
        let mut snapshot = Vec::with_capacity(items.len());
        for item in items.iter_mut() {
            let id = self.ensure_id_is_generated(item)?;
            snapshot.push((id, item.clone()));
        }

        let mut records = self.records.write();

        if let Err(err) = check_uniqueness(unique_keys, &*records, &snapshot) {
            if err.is_constraint_violation() {
                self.stats.record_constraint_violation();
            }
            return Err(err);
        }

        let written = snapshot.len();
        for (id, record) in snapshot {
            match records.entry(id) {
                Entry::Occupied(mut stored) => stored.get_mut().copy_from(&record),
                Entry::Vacant(slot) => {
                    slot.insert(record);
                }
            }
        }
        drop(records);

        self.stats.record_upserts(written);
        tracing::trace!(kind = S::KIND, records = written, "upsert applied");
        Ok(())
    }

    fn delete_where(&self, predicate: &dyn Fn(&S) -> bool) -> usize {
        // Shared while the predicate runs, so it may read this table.
        let records = self.records.upgradable_read();
        let matching: Vec<RecordId> = records
            .iter()
            .filter(|(_, record)| predicate(*record))
            .map(|(id, _)| *id)
            .collect();
        if matching.is_empty() {
            return 0;
        }

        let mut records = RwLockUpgradableReadGuard::upgrade(records);
        for id in &matching {
            records.remove(id);
        }
        drop(records);

        self.stats.record_deletes(matching.len());
        matching.len()
    }

    fn delete_ids(&self, ids: &[RecordId]) -> usize {
        let mut records = self.records.write();
        let removed = ids.iter().filter(|id| records.remove(*id).is_some()).count();
        drop(records);

        self.stats.record_deletes(removed);
        removed
    }
}

impl<S: PersistenceState> fmt::Debug for Table<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("kind", &S::KIND)
            .field("records", &self.count_all())
            .finish_non_exhaustive()
    }
}
