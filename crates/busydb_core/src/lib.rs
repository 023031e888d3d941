//! # BusyDB Core
//!
//! In-memory repository store for the BusyList application.
//!
//! This crate provides:
//! - A generic [`Table`] per entity kind with repository-style CRUD
//! - Copy isolation: callers only ever hold copies of stored records
//! - Multi-key uniqueness checks on every upsert
//! - Per-kind id generation from a self-bootstrapping [`SeedTable`]
//! - A coarse, re-entrant [`Transaction`] scope over the whole service
//!
//! Everything lives in process memory; nothing is persisted.
//!
//! ```rust
//! use busydb_core::{PersistenceService, PersistenceState, Repository, User};
//!
//! let service = PersistenceService::new()?;
//! let users = service.users();
//!
//! let mut alice = users.create();
//! alice.login = "alice".into();
//! users.upsert_one(&mut alice, &[User::by_login()])?;
//!
//! let mut impostor = users.create();
//! impostor.login = "alice".into();
//! assert!(users.upsert_one(&mut impostor, &[User::by_login()]).is_err());
//! assert_eq!(users.count_all(), 1);
//! # Ok::<(), busydb_core::CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod entity;
mod error;
mod seed;
mod service;
mod stats;
mod table;
mod tables;
mod transaction;

pub use config::Config;
pub use entity::{Identity, PersistenceState, RecordId};
pub use error::{CoreError, CoreResult};
pub use seed::{IdSeed, SeedTable};
pub use service::PersistenceService;
pub use stats::{StatsSnapshot, StoreStats};
pub use table::{KeyValue, Repository, Table, UniqueKey};
pub use tables::{AccessToken, Category, Password, User, UserRole, WorkItem, WorkItemCategory};
pub use transaction::{Transaction, TransactionState};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
