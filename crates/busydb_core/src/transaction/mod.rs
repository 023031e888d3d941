//! Coarse transaction scopes.
//!
//! A transaction serializes multi-call sequences against other
//! transactions of the same service. It provides mutual exclusion only:
//! there is no undo log, so a failure half-way through a scope leaves the
//! writes made before it in place.

mod scope;

pub(crate) use scope::TransactionLock;
pub use scope::{Transaction, TransactionState};
