//! # BusyDB Testkit
//!
//! Test utilities for BusyDB.
//!
//! This crate provides:
//! - Test fixtures and pre-populated services
//! - Property-based test generators using proptest
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust
//! use busydb_testkit::prelude::*;
//! use busydb_core::Repository;
//!
//! with_service(|service| {
//!     let draft = service.users().create();
//!     assert!(!busydb_core::PersistenceState::has_id(&draft));
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
