//! Per-kind id generation.
//!
//! Every entity kind has one [`IdSeed`] row holding the last id issued for
//! it. The rows live in a [`SeedTable`], which is itself a table and so
//! needs a seed row of its own. That circularity is broken once, when the
//! service is built:
//!
//! 1. The seed table's own row is inserted by hand under the configured
//!    bootstrap id, still detached, and indexed by kind.
//! 2. The row then draws its id through the regular path, which increments
//!    its own counter to exactly the bootstrap id.
//!
//! From then on every table, the seed table included, gets ids through
//! [`SeedTable::next_id_for`] and registers its row with a normal upsert.

use crate::config::Config;
use crate::entity::{Identity, PersistenceState, RecordId};
use crate::error::{CoreError, CoreResult};
use crate::stats::StoreStats;
use crate::table::{Repository, Table, UniqueKey};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// Source of fresh record ids.
pub(crate) trait IdGenerator: Send + Sync {
    /// Issues the next id for `kind`.
    fn next_id_for(&self, kind: &str) -> CoreResult<RecordId>;
}

/// Counter row of one entity kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdSeed {
    /// Record identity.
    #[serde(rename = "id")]
    pub identity: Identity<IdSeed>,
    /// Kind whose ids this row issues.
    pub table_name: String,
    /// Last id issued for the kind.
    pub seed: u64,
}

impl PersistenceState for IdSeed {
    const KIND: &'static str = "IdSeed";

    fn identity(&self) -> &Identity<Self> {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity<Self> {
        &mut self.identity
    }
}

impl IdSeed {
    /// One seed row per kind.
    pub fn by_table_name() -> UniqueKey<Self> {
        UniqueKey::new("table_name", |s: &IdSeed| s.table_name.clone())
    }
}

/// The table of [`IdSeed`] rows.
///
/// Rows are written only by the seed subsystem. Reads return copies like
/// any other table.
pub struct SeedTable {
    /// Seed rows.
    table: Table<IdSeed>,
    /// Kind -> id of its seed row. Also serializes id issuance.
    by_kind: Mutex<HashMap<String, RecordId>>,
    /// Shared operation counters. Only ids issued to other kinds count.
    stats: Arc<StoreStats>,
}

impl SeedTable {
    /// Creates the seed table and seeds its own row.
    pub(crate) fn bootstrap(config: &Config, stats: Arc<StoreStats>) -> CoreResult<Arc<Self>> {
        let bootstrap_id = config.bootstrap_id;
        if bootstrap_id.as_u64() == 0 {
            return Err(CoreError::invalid_operation("bootstrap id must be at least 1"));
        }

        let seeds = Arc::new_cyclic(|weak: &Weak<SeedTable>| {
            let own: Weak<SeedTable> = Weak::clone(weak);
            let ids: Weak<dyn IdGenerator> = own;
            SeedTable {
                // Seed rows are bookkeeping; their writes and reads stay out of the
                // service counters.
                table: Table::new(ids, Arc::new(StoreStats::new(false))),
                by_kind: Mutex::new(HashMap::new()),
                stats,
            }
        });

        // Phase 1: own row by hand, detached, one below the bootstrap id.
        let own = IdSeed {
            identity: Identity::detached(),
            table_name: IdSeed::KIND.to_owned(),
            seed: bootstrap_id.as_u64() - 1,
        };
        seeds.table.insert_raw(bootstrap_id, own);
        seeds
            .by_kind
            .lock()
            .insert(IdSeed::KIND.to_owned(), bootstrap_id);

        // Phase 2: the row draws its id through the regular path.
        let issued = seeds.next_id_for(IdSeed::KIND)?;
        if issued != bootstrap_id {
            return Err(CoreError::invalid_operation(format!(
                "seed bootstrap issued {issued}, expected {bootstrap_id}"
            )));
        }
        seeds
            .table
            .update_in_place(bootstrap_id, |row| row.identity_mut().assign(issued))
            .ok_or_else(|| CoreError::invalid_operation("seed row vanished during bootstrap"))?;

        tracing::debug!(id = %bootstrap_id, "seed table bootstrapped");
        Ok(seeds)
    }

    /// Adds the seed row of `kind`, starting its counter at zero.
    pub(crate) fn register(&self, kind: &str) -> CoreResult<RecordId> {
        let mut row = IdSeed {
            identity: Identity::detached(),
            table_name: kind.to_owned(),
            seed: 0,
        };
        self.table
            .upsert_one(&mut row, &[IdSeed::by_table_name()])
            .map_err(|err| {
                if err.is_constraint_violation() {
                    CoreError::KindAlreadyRegistered {
                        kind: kind.to_owned(),
                    }
                } else {
                    err
                }
            })?;

        let id = row
            .id()
            .ok_or_else(|| CoreError::invalid_operation("seed row stored without an id"))?;
        self.by_kind.lock().insert(kind.to_owned(), id);
        Ok(id)
    }

    /// Returns the last id issued for `kind`.
    #[must_use]
    pub fn current(&self, kind: &str) -> Option<u64> {
        let row = *self.by_kind.lock().get(kind)?;
        self.table.get_by_id(row).map(|seed| seed.seed)
    }

    /// Returns the registered kinds, sorted.
    #[must_use]
    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.by_kind.lock().keys().cloned().collect();
        kinds.sort();
        kinds
    }

    /// Returns copies of all seed rows, in id order.
    #[must_use]
    pub fn get_all(&self) -> Vec<IdSeed> {
        self.table.get_all()
    }

    /// Returns the number of seed rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.count_all()
    }

    /// Returns true if no seed row exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IdGenerator for SeedTable {
    fn next_id_for(&self, kind: &str) -> CoreResult<RecordId> {
        let by_kind = self.by_kind.lock();
        let row = *by_kind.get(kind).ok_or_else(|| CoreError::unknown_kind(kind))?;
        let seed = self
            .table
            .update_in_place(row, |record| {
                let next = record.seed.checked_add(1)?;
                record.seed = next;
                Some(next)
            })
            .ok_or_else(|| CoreError::unknown_kind(kind))?
            .ok_or_else(|| {
                CoreError::invalid_operation(format!("record ids of {kind} are exhausted"))
            })?;
        drop(by_kind);

        if kind != IdSeed::KIND {
            self.stats.record_id_issued();
        }
        Ok(RecordId::new(seed))
    }
}

impl std::fmt::Debug for SeedTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedTable")
            .field("kinds", &self.kinds())
            .finish_non_exhaustive()
    }
}
