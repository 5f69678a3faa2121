use std::collections::BTreeMap;

use crate::{TxRef, Version};

/// A buffered write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchWrite {
    Put(Vec<u8>),
    Delete,
}

/// All writes of one logical invocation, committed atomically.
///
/// The batch also carries the read set: for every key the invocation read,
/// the version it observed (`None` when the key was absent). The ledger
/// refuses the commit if any of those keys moved in the meantime.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    tx_ref: TxRef,
    writes: BTreeMap<String, BatchWrite>,
    reads: BTreeMap<String, Option<Version>>,
}

impl WriteBatch {
    /// Creates an empty batch with a fresh transaction reference.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the reference of the invocation this batch belongs to.
    pub fn tx_ref(&self) -> TxRef {
        self.tx_ref
    }

    /// Buffers a put. A later write to the same key replaces it.
    pub fn put(&mut self, key: impl Into<String>, value: Vec<u8>) {
        self.writes.insert(key.into(), BatchWrite::Put(value));
    }

    /// Buffers a delete. A later write to the same key replaces it.
    pub fn delete(&mut self, key: impl Into<String>) {
        self.writes.insert(key.into(), BatchWrite::Delete);
    }

    /// Records the version observed when reading `key`.
    ///
    /// Only the first observation is kept: it is the one the invocation's
    /// decisions were based on.
    pub fn record_read(&mut self, key: impl Into<String>, version: Option<Version>) {
        self.reads.entry(key.into()).or_insert(version);
    }

    /// Returns the buffered writes in key order.
    pub fn writes(&self) -> impl Iterator<Item = (&str, &BatchWrite)> {
        self.writes.iter().map(|(k, w)| (k.as_str(), w))
    }

    /// Returns the recorded read set in key order.
    pub fn reads(&self) -> impl Iterator<Item = (&str, Option<Version>)> {
        self.reads.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Returns the number of buffered writes.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Checks the batch before it is submitted.
    pub fn validate(&self) -> crate::Result<()> {
        if self.writes.is_empty() {
            return Err(crate::LedgerError::InvalidBatch(
                "cannot commit an empty batch".to_string(),
            ));
        }
        if let Some(key) = self.writes.keys().find(|k| k.is_empty()) {
            return Err(crate::LedgerError::InvalidBatch(format!(
                "empty key in batch (write {key:?})"
            )));
        }
        Ok(())
    }
}
