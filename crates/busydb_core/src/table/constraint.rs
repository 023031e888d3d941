//! Uniqueness keys and the constraint checker.

use crate::entity::{PersistenceState, RecordId};
use crate::error::{CoreError, CoreResult};
use std::borrow::Cow;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use uuid::Uuid;

/// A comparable value extracted from a state by a [`UniqueKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyValue {
    /// Absent value. Compares equal to other absent values.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Int(i64),
    /// Unsigned integer value.
    Uint(u64),
    /// Text value. Compared exactly, case included.
    Text(String),
    /// Reference to another record.
    Id(RecordId),
    /// UUID value.
    Uuid(Uuid),
    /// Several values that are unique only together.
    Composite(Vec<KeyValue>),
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::Id(v) => write!(f, "{v}"),
            Self::Uuid(v) => write!(f, "{v}"),
            Self::Composite(parts) => {
                write!(f, "(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{part}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<bool> for KeyValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for KeyValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for KeyValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for KeyValue {
    fn from(v: u64) -> Self {
        Self::Uint(v)
    }
}

impl From<String> for KeyValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for KeyValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<RecordId> for KeyValue {
    fn from(v: RecordId) -> Self {
        Self::Id(v)
    }
}

impl From<Uuid> for KeyValue {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl<T: Into<KeyValue>> From<Option<T>> for KeyValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<A: Into<KeyValue>, B: Into<KeyValue>> From<(A, B)> for KeyValue {
    fn from((a, b): (A, B)) -> Self {
        Self::Composite(vec![a.into(), b.into()])
    }
}

impl<A: Into<KeyValue>, B: Into<KeyValue>, C: Into<KeyValue>> From<(A, B, C)> for KeyValue {
    fn from((a, b, c): (A, B, C)) -> Self {
        Self::Composite(vec![a.into(), b.into(), c.into()])
    }
}

/// A named uniqueness key: a pure function from state to [`KeyValue`].
///
/// Keys are supplied per upsert; no two records of the table may share the
/// value a key extracts.
///
/// ```rust
/// use busydb_core::{UniqueKey, User};
///
/// let by_login = UniqueKey::new("login", |u: &User| u.login.clone());
/// let by_full_name = UniqueKey::new("full_name", |u: &User| {
///     (u.first_name.clone(), u.surname.clone())
/// });
/// assert_eq!(by_login.name(), "login");
/// # let _ = by_full_name;
/// ```
pub struct UniqueKey<S> {
    name: Cow<'static, str>,
    select: Box<dyn Fn(&S) -> KeyValue + Send + Sync>,
}

impl<S> UniqueKey<S> {
    /// Creates a uniqueness key from a name and a selector.
    pub fn new<K, F>(name: impl Into<Cow<'static, str>>, select: F) -> Self
    where
        K: Into<KeyValue>,
        F: Fn(&S) -> K + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            select: Box::new(move |state| select(state).into()),
        }
    }

    /// Returns the key name used in violation errors.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Extracts the key value of a state.
    pub fn value_of(&self, state: &S) -> KeyValue {
        (self.select)(state)
    }
}

impl<S> fmt::Debug for UniqueKey<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniqueKey")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Verifies that upserting `incoming` over `stored` keeps every key unique.
///
/// Keys are checked in order and the first violation is returned. A stored
/// record may share a value with an incoming one only when that stored
/// record is itself part of the batch, which covers both plain updates and
/// two records swapping their values.
///
/// Index maps are rebuilt from the whole table on every call.
pub(crate) fn check_uniqueness<S: PersistenceState>(
    keys: &[UniqueKey<S>],
    stored: &BTreeMap<RecordId, S>,
    incoming: &[(RecordId, S)],
) -> CoreResult<()> {
    if keys.is_empty() || incoming.is_empty() {
        return Ok(());
    }

    let incoming_ids: HashSet<RecordId> = incoming.iter().map(|(id, _)| *id).collect();

    for key in keys {
        let mut stored_by_value: HashMap<KeyValue, RecordId> = HashMap::with_capacity(stored.len());
        for (id, record) in stored {
            if let Some(previous) = stored_by_value.insert(key.value_of(record), *id) {
                tracing::warn!(
                    kind = S::KIND,
                    key = key.name(),
                    first = %previous,
                    second = %id,
                    "stored records already violate uniqueness"
                );
                return Err(CoreError::integrity_violation(
                    S::KIND,
                    key.name(),
                    previous,
                    *id,
                ));
            }
        }

        let values: Vec<(RecordId, KeyValue)> = incoming
            .iter()
            .map(|(id, record)| (*id, key.value_of(record)))
            .collect();

        let mut incoming_by_value: HashMap<&KeyValue, RecordId> = HashMap::with_capacity(values.len());
        for (id, value) in &values {
            match incoming_by_value.entry(value) {
                Entry::Occupied(_) => {
                    return Err(CoreError::unique_violation(
                        S::KIND,
                        key.name(),
                        value.to_string(),
                        *id,
                    ));
                }
                Entry::Vacant(slot) => {
                    slot.insert(*id);
                }
            }
        }

        for (id, value) in &values {
            if let Some(holder) = stored_by_value.get(value) {
                if !incoming_ids.contains(holder) {
                    return Err(CoreError::unique_violation(
                        S::KIND,
                        key.name(),
                        value.to_string(),
                        *id,
                    ));
                }
            }
        }
    }

    Ok(())
}
