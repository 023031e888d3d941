//! The state-object contract every entity kind implements.

use crate::entity::{Identity, RecordId};
use std::fmt::Debug;

/// Contract between an entity kind and the generic [`Table`](crate::Table).
///
/// A state is a plain value: `Clone` produces an independent copy, and the
/// embedded [`Identity`] carries the record id once the store assigned one.
/// Implementing this trait is all an entity kind needs to be stored.
///
/// # Example
///
/// ```rust
/// use busydb_core::{Identity, PersistenceState};
///
/// #[derive(Debug, Clone, Default)]
/// struct Note {
///     identity: Identity<Note>,
///     text: String,
/// }
///
/// impl PersistenceState for Note {
///     const KIND: &'static str = "Note";
///
///     fn identity(&self) -> &Identity<Self> {
///         &self.identity
///     }
///
///     fn identity_mut(&mut self) -> &mut Identity<Self> {
///         &mut self.identity
///     }
/// }
/// ```
pub trait PersistenceState: Clone + Default + Debug + Send + Sync + 'static {
    /// Stable kind name, used as the table name and the seed key.
    const KIND: &'static str;

    /// Returns the embedded identity.
    fn identity(&self) -> &Identity<Self>;

    /// Returns the embedded identity for mutation.
    fn identity_mut(&mut self) -> &mut Identity<Self>;

    /// Returns the assigned record id, if any.
    #[inline]
    fn id(&self) -> Option<RecordId> {
        self.identity().get()
    }

    /// Returns true once the record has an id.
    #[inline]
    fn has_id(&self) -> bool {
        self.identity().is_assigned()
    }

    /// Overwrites every field with the values of `other`.
    ///
    /// The id is taken from `other` only when `other` has one, so a detached
    /// source never erases an assigned id.
    fn copy_from(&mut self, other: &Self) {
        let mut identity = *self.identity();
        identity.copy_from(other.identity());
        *self = other.clone();
        *self.identity_mut() = identity;
    }
}
