//! Entity kinds stored by the BusyList application.

mod auth;
mod busy_list;

pub use auth::{AccessToken, Password, User, UserRole};
pub use busy_list::{Category, WorkItem, WorkItemCategory};
