//! Ledger access facade.
//!
//! The ledger is an ordered, transactional key/value store. Everything a
//! single logical invocation writes is collected into a [`WriteBatch`] and
//! committed atomically; reads recorded in the batch are re-validated at
//! commit time so conflicting invocations are serialised.

pub mod batch;
pub mod entry;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod selector;
pub mod store;

pub use batch::{BatchWrite, WriteBatch};
pub use entry::{CommitReceipt, LedgerEntry, TxRef, Version};
pub use error::{LedgerError, Result};
pub use memory::InMemoryLedger;
pub use postgres::PostgresLedger;
pub use selector::{Condition, Selector};
pub use store::{EntryStream, Ledger, LedgerExt};
