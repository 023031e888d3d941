//! Record identity and the state-object contract.

mod id;
mod state;

pub use id::{Identity, RecordId};
pub use state::PersistenceState;
