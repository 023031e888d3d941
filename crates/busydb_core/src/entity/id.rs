//! Record identifiers.

use serde::{Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Identifier of a persisted record.
///
/// Record ids are issued per entity kind by the seed table. They are:
/// - Strictly increasing within a kind
/// - Assigned once, immutable afterwards
/// - Never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    /// Creates a record id from its raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<RecordId> for u64 {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

/// The id slot embedded in every entity state of kind `S`.
///
/// A fresh identity is detached. Only the store can assign an id, and it
/// does so at most once; copying from another state of the same kind is the
/// only other way an identity changes. The kind parameter keeps an id
/// issued for one kind from being moved onto a record of another:
///
/// ```rust,compile_fail
/// use busydb_core::{User, WorkItem};
///
/// let user = User::default();
/// let mut item = WorkItem::default();
/// item.identity = user.identity;
/// ```
pub struct Identity<S> {
    id: Option<RecordId>,
    kind: PhantomData<fn() -> S>,
}

impl<S> Identity<S> {
    /// Returns a detached identity.
    #[must_use]
    pub const fn detached() -> Self {
        Self {
            id: None,
            kind: PhantomData,
        }
    }

    /// Returns the assigned id, if any.
    #[inline]
    #[must_use]
    pub const fn get(&self) -> Option<RecordId> {
        self.id
    }

    /// Returns true once an id has been assigned.
    #[inline]
    #[must_use]
    pub const fn is_assigned(&self) -> bool {
        self.id.is_some()
    }

    pub(crate) fn assign(&mut self, id: RecordId) {
        debug_assert!(self.id.is_none(), "record id assigned twice");
        self.id = Some(id);
    }

    /// Takes the other identity when it carries an id.
    pub(crate) fn copy_from(&mut self, other: &Self) {
        if other.id.is_some() {
            self.id = other.id;
        }
    }
}

// Manual impls: the derives would require `S` itself to implement each trait.

impl<S> Clone for Identity<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Identity<S> {}

impl<S> Default for Identity<S> {
    fn default() -> Self {
        Self::detached()
    }
}

impl<S> PartialEq for Identity<S> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<S> Eq for Identity<S> {}

impl<S> Hash for Identity<S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<S> fmt::Debug for Identity<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "Identity({id})"),
            None => write!(f, "Identity(detached)"),
        }
    }
}

impl<S> Serialize for Identity<S> {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        self.id.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_display() {
        assert_eq!(format!("{}", RecordId::new(42)), "#42");
    }

    #[test]
    fn record_id_ordering() {
        assert!(RecordId::new(1) < RecordId::new(2));
    }

    #[test]
    fn identity_starts_detached() {
        let identity = Identity::<()>::default();
        assert!(!identity.is_assigned());
        assert_eq!(identity.get(), None);
    }

    #[test]
    fn copy_from_keeps_own_id_when_other_is_detached() {
        let mut identity = Identity::<()>::detached();
        identity.assign(RecordId::new(7));

        identity.copy_from(&Identity::detached());
        assert_eq!(identity.get(), Some(RecordId::new(7)));

        let mut other = Identity::<()>::detached();
        other.assign(RecordId::new(9));
        identity.copy_from(&other);
        assert_eq!(identity.get(), Some(RecordId::new(9)));
    }

    #[test]
    fn identity_serializes_as_plain_id() {
        let mut identity = Identity::<()>::detached();
        assert_eq!(serde_json::to_value(identity).unwrap(), serde_json::Value::Null);
        identity.assign(RecordId::new(5));
        assert_eq!(serde_json::to_value(identity).unwrap(), 5);
        assert_eq!(format!("{identity:?}"), "Identity(#5)");
    }
}
