//! Shared identifiers for the travel booking ledger.

mod types;

pub use types::{EntityId, EntityKind, LedgerKey};
