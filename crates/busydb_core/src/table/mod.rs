//! Generic table, repository contract and uniqueness keys.
//!
//! `Table<S>` is written once and instantiated per entity kind. It
//! implements [`Repository`] for any `S: PersistenceState`.

mod constraint;
mod repository;
mod store;

pub use constraint::{KeyValue, UniqueKey};
pub use repository::Repository;
pub use store::Table;
