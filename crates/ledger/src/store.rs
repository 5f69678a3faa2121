use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use common::{EntityKind, LedgerKey};
use futures_core::Stream;

use crate::{CommitReceipt, LedgerEntry, Result, Version, WriteBatch};

/// A stream of ledger entries.
pub type EntryStream = Pin<Box<dyn Stream<Item = Result<LedgerEntry>> + Send>>;

/// Core trait for ledger implementations.
///
/// A ledger is an ordered key/value store with atomic multi-key commits.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Reads the committed value of a key.
    ///
    /// Returns None if the key is absent.
    async fn get(&self, key: &str) -> Result<Option<LedgerEntry>>;

    /// Streams every key in the half-open range `[start, end)` in key order.
    ///
    /// An empty `end` means "no upper bound".
    async fn range_scan(&self, start: &str, end: &str) -> Result<EntryStream>;

    /// Streams every JSON document matching a selector query.
    ///
    /// The query is the string form produced by
    /// [`Selector::to_query_string`](crate::Selector::to_query_string).
    /// Matches are returned in key order.
    async fn rich_query(&self, query: &str) -> Result<EntryStream>;

    /// Applies a batch atomically.
    ///
    /// Fails with `Conflict` if any key in the batch's read set has changed
    /// since it was read; in that case nothing is written.
    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt>;

    /// Returns the height of the last committed batch.
    async fn height(&self) -> Result<Version>;
}

/// Extension trait providing convenience methods for ledgers.
#[async_trait]
pub trait LedgerExt: Ledger {
    /// Checks if a key is present.
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Streams every record of one entity kind in identifier order.
    async fn scan_kind(&self, kind: EntityKind) -> Result<EntryStream> {
        let (start, end) = LedgerKey::kind_range(kind);
        self.range_scan(&start, &end).await
    }
}

impl<T: Ledger + ?Sized> LedgerExt for T {}

#[async_trait]
impl<T: Ledger + ?Sized> Ledger for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<LedgerEntry>> {
        (**self).get(key).await
    }

    async fn range_scan(&self, start: &str, end: &str) -> Result<EntryStream> {
        (**self).range_scan(start, end).await
    }

    async fn rich_query(&self, query: &str) -> Result<EntryStream> {
        (**self).rich_query(query).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt> {
        (**self).commit(batch).await
    }

    async fn height(&self) -> Result<Version> {
        (**self).height().await
    }
}

pub(crate) fn in_range(key: &str, start: &str, end: &str) -> bool {
    key >= start && (end.is_empty() || key < end)
}

pub(crate) fn check_range(start: &str, end: &str) -> Result<()> {
    if !end.is_empty() && end < start {
        return Err(crate::LedgerError::InvalidQuery(format!(
            "range end {end:?} sorts before start {start:?}"
        )));
    }
    Ok(())
}
