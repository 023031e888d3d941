//! The repository contract exposed for every entity kind.

use crate::entity::{PersistenceState, RecordId};
use crate::error::CoreResult;
use crate::table::UniqueKey;

/// Repository-style access to the records of one entity kind.
///
/// Every read returns copies: mutating a returned state never changes the
/// store until it is passed back to [`upsert`](Repository::upsert).
///
/// Filtering is done with host-language predicates; there is no query
/// language. A predicate may read the repository it is passed to, but must
/// not write to it.
///
/// # Example
///
/// ```rust
/// use busydb_core::{PersistenceService, PersistenceState, Repository, User};
///
/// let service = PersistenceService::new().unwrap();
/// let users = service.users();
///
/// let mut alice = users.create();
/// alice.login = "alice".into();
/// users.upsert_one(&mut alice, &[User::by_login()]).unwrap();
///
/// let found = users.get_single(&|u| u.login == "alice").unwrap();
/// assert_eq!(found.id(), alice.id());
/// ```
pub trait Repository<S: PersistenceState>: Send + Sync {
    /// Returns a new detached state. Nothing is stored.
    fn create(&self) -> S;

    /// Returns copies of all records matching `predicate`.
    ///
    /// Records come back in id order.
    fn get(&self, predicate: &dyn Fn(&S) -> bool) -> Vec<S>;

    /// Returns copies of all records, in id order.
    fn get_all(&self) -> Vec<S>;

    /// Returns a copy of the first record matching `predicate`.
    fn get_single(&self, predicate: &dyn Fn(&S) -> bool) -> Option<S>;

    /// Returns a copy of the record with this id.
    fn get_by_id(&self, id: RecordId) -> Option<S>;

    /// Counts the records matching `predicate`.
    fn count(&self, predicate: &dyn Fn(&S) -> bool) -> usize;

    /// Counts all records.
    fn count_all(&self) -> usize;

    /// Assigns an id to `item` unless it already has one.
    ///
    /// The id is drawn from the seed table exactly once per record and never
    /// changes afterwards. Nothing is stored.
    fn ensure_id_is_generated(&self, item: &mut S) -> CoreResult<RecordId>;

    /// Inserts or updates `items`, keyed by id.
    ///
    /// Detached items receive an id first; the caller's states carry it when
    /// this returns, even if the upsert is then rejected. Internal copies are
    /// stored, so later changes to `items` have no effect on the table.
    ///
    /// # Errors
    ///
    /// Returns `UniqueConstraintViolated` when a key in `unique_keys` would be
    /// shared by two records. The table is left unchanged.
    fn upsert(&self, items: &mut [S], unique_keys: &[UniqueKey<S>]) -> CoreResult<()>;

    /// Inserts or updates a single item. See [`upsert`](Repository::upsert).
    fn upsert_one(&self, item: &mut S, unique_keys: &[UniqueKey<S>]) -> CoreResult<()> {
        self.upsert(std::slice::from_mut(item), unique_keys)
    }

    /// Deletes the record of `item`. A detached item is ignored.
    fn delete(&self, item: &S) -> usize {
        self.delete_many(std::slice::from_ref(item))
    }

    /// Deletes the records of `items`, skipping detached ones.
    fn delete_many(&self, items: &[S]) -> usize {
        let ids: Vec<RecordId> = items.iter().filter_map(PersistenceState::id).collect();
        self.delete_ids(&ids)
    }

    /// Deletes every record matching `predicate`.
    ///
    /// Matching ids are collected before anything is removed, so a panicking
    /// predicate leaves the table untouched.
    fn delete_where(&self, predicate: &dyn Fn(&S) -> bool) -> usize;

    /// Deletes the records with these ids. Unknown ids are ignored.
    ///
    /// Returns the number of records removed.
    fn delete_ids(&self, ids: &[RecordId]) -> usize;
}
