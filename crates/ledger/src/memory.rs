use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    BatchWrite, CommitReceipt, LedgerEntry, LedgerError, Result, Selector, Version, WriteBatch,
    store::{EntryStream, Ledger, check_range, in_range},
};

#[derive(Default)]
struct State {
    entries: BTreeMap<String, (Vec<u8>, Version)>,
    height: Version,
}

/// In-memory ledger implementation.
///
/// Provides the same semantics as the PostgreSQL implementation and is used
/// by the API when no database is configured, and throughout the tests.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<RwLock<State>>,
}

impl InMemoryLedger {
    /// Creates a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of keys stored.
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    /// Returns true if no keys are stored.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }

    /// Writes raw bytes under a key, bypassing batches and read validation.
    ///
    /// Lets tests plant records that the domain layer would never produce.
    pub async fn put_raw(&self, key: impl Into<String>, value: Vec<u8>) {
        let mut state = self.state.write().await;
        state.height = state.height.next();
        let version = state.height;
        state.entries.insert(key.into(), (value, version));
    }

    /// Clears all keys and resets the height.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        *state = State::default();
    }

    fn collect(
        state: &State,
        start: &str,
        end: &str,
        keep: impl Fn(&LedgerEntry) -> bool,
    ) -> Vec<LedgerEntry> {
        state
            .entries
            .range(start.to_string()..)
            .take_while(|(k, _)| in_range(k, start, end))
            .map(|(k, (v, ver))| LedgerEntry::new(k.clone(), v.clone(), *ver))
            .filter(|e| keep(e))
            .collect()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn get(&self, key: &str) -> Result<Option<LedgerEntry>> {
        let state = self.state.read().await;
        Ok(state
            .entries
            .get(key)
            .map(|(v, ver)| LedgerEntry::new(key, v.clone(), *ver)))
    }

    async fn range_scan(&self, start: &str, end: &str) -> Result<EntryStream> {
        use futures_util::stream;

        check_range(start, end)?;
        let state = self.state.read().await;
        let entries = Self::collect(&state, start, end, |_| true);
        Ok(Box::pin(stream::iter(entries.into_iter().map(Ok))))
    }

    async fn rich_query(&self, query: &str) -> Result<EntryStream> {
        use futures_util::stream;

        let selector = Selector::parse(query)?;
        let state = self.state.read().await;
        let entries = Self::collect(&state, "", "", |entry| {
            entry.document().is_some_and(|doc| selector.matches(&doc))
        });
        Ok(Box::pin(stream::iter(entries.into_iter().map(Ok))))
    }

    #[tracing::instrument(skip(self, batch), fields(tx_ref = %batch.tx_ref(), writes = batch.len()))]
    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt> {
        batch.validate()?;

        let mut state = self.state.write().await;

        // Validate the read set before touching anything
        for (key, expected) in batch.reads() {
            let actual = state.entries.get(key).map(|(_, v)| *v);
            if actual != expected {
                metrics::counter!("ledger_commit_conflicts_total").increment(1);
                tracing::debug!(key, ?expected, ?actual, "Read set invalidated");
                return Err(LedgerError::Conflict {
                    key: key.to_string(),
                    expected,
                    actual,
                });
            }
        }

        let height = state.height.next();
        for (key, write) in batch.writes() {
            match write {
                BatchWrite::Put(value) => {
                    state.entries.insert(key.to_string(), (value.clone(), height));
                }
                BatchWrite::Delete => {
                    state.entries.remove(key);
                }
            }
        }
        state.height = height;

        metrics::counter!("ledger_commits_total").increment(1);
        metrics::counter!("ledger_keys_written_total").increment(batch.len() as u64);

        Ok(CommitReceipt {
            tx_ref: batch.tx_ref(),
            height,
            keys_written: batch.len(),
            committed_at: Utc::now(),
        })
    }

    async fn height(&self) -> Result<Version> {
        Ok(self.state.read().await.height)
    }
}
