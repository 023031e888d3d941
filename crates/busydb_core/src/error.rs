//! Error types for BusyDB core.

use crate::entity::RecordId;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in BusyDB core operations.
///
/// Absence of a record is never an error: lookups return `Option`.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An upsert would make two records share a unique key value.
    ///
    /// The failed upsert left the table unchanged.
    #[error("unique constraint {key} violated on {kind}: record {id} cannot take value {value}")]
    UniqueConstraintViolated {
        /// Entity kind of the table.
        kind: String,
        /// Name of the uniqueness key.
        key: String,
        /// Rendering of the colliding key value.
        value: String,
        /// Id of the incoming record that collided.
        id: RecordId,
    },

    /// Stored records already violate a uniqueness key.
    ///
    /// This can only happen if data reached the table outside the checked
    /// write path. Callers should treat it as non-recoverable.
    #[error("integrity violation on {kind}: records {first} and {second} already share a value of {key}")]
    IntegrityViolation {
        /// Entity kind of the table.
        kind: String,
        /// Name of the uniqueness key.
        key: String,
        /// First stored record holding the value.
        first: RecordId,
        /// Second stored record holding the value.
        second: RecordId,
    },

    /// No seed row exists for the entity kind.
    #[error("no id seed registered for kind {kind}")]
    UnknownKind {
        /// The entity kind.
        kind: String,
    },

    /// A table for this entity kind is already registered.
    #[error("a table is already registered for kind {kind}")]
    KindAlreadyRegistered {
        /// The entity kind.
        kind: String,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },

    /// The persistence service owning the id seeds is gone.
    #[error("persistence service has been dropped")]
    ServiceDropped,
}

impl CoreError {
    /// Creates a unique constraint violation error.
    pub fn unique_violation(
        kind: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
        id: RecordId,
    ) -> Self {
        Self::UniqueConstraintViolated {
            kind: kind.into(),
            key: key.into(),
            value: value.into(),
            id,
        }
    }

    /// Creates an integrity violation error.
    pub fn integrity_violation(
        kind: impl Into<String>,
        key: impl Into<String>,
        first: RecordId,
        second: RecordId,
    ) -> Self {
        Self::IntegrityViolation {
            kind: kind.into(),
            key: key.into(),
            first,
            second,
        }
    }

    /// Creates an unknown kind error.
    pub fn unknown_kind(kind: impl Into<String>) -> Self {
        Self::UnknownKind { kind: kind.into() }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true for caller-triggered uniqueness violations.
    #[must_use]
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::UniqueConstraintViolated { .. })
    }

    /// Returns true when the store itself is inconsistent.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::IntegrityViolation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_message_names_kind_and_key() {
        let err = CoreError::unique_violation("User", "login", "\"alice\"", RecordId::new(2));
        let msg = err.to_string();
        assert!(msg.contains("User"));
        assert!(msg.contains("login"));
        assert!(msg.contains("#2"));
        assert!(err.is_constraint_violation());
        assert!(!err.is_fatal());
    }

    #[test]
    fn integrity_violation_is_fatal() {
        let err = CoreError::integrity_violation("User", "email", RecordId::new(1), RecordId::new(4));
        assert!(err.is_fatal());
        assert!(!err.is_constraint_violation());
    }
}
