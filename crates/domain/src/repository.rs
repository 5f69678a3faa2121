//! Typed access to ledger records.
//!
//! Two read modes exist side by side. Single-entity reads are strict: a
//! record that fails to decode is an error. Bulk reads are lenient: the
//! returned [`EntityStream`] skips undecodable records with a warning and
//! keeps going.

use std::pin::Pin;

use common::EntityId;
use futures_core::Stream;
use futures_util::{StreamExt, future};
use ledger::{CommitReceipt, EntryStream, Ledger, LedgerExt, Selector, TxRef, WriteBatch};

use crate::codec::{self, Entity, selector_for};
use crate::error::{DomainError, Result};

/// A lazy stream of decoded entities.
pub type EntityStream<E> = Pin<Box<dyn Stream<Item = Result<E>> + Send>>;

/// Read access to entities plus a factory for units of work.
#[derive(Clone)]
pub struct Repository<L: Ledger> {
    ledger: L,
}

impl<L: Ledger> Repository<L> {
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Reads one entity. Absent is `None`; an undecodable record is an error.
    pub async fn get<E: Entity>(&self, id: &EntityId) -> Result<Option<E>> {
        match self.ledger.get(E::key_for(id).as_str()).await? {
            Some(entry) => Ok(Some(codec::decode(&entry.value)?)),
            None => Ok(None),
        }
    }

    /// Reads one entity, failing with `NotFound` when absent.
    pub async fn require<E: Entity>(&self, id: &EntityId) -> Result<E> {
        self.get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(E::KIND, id))
    }

    pub async fn exists<E: Entity>(&self, id: &EntityId) -> Result<bool> {
        Ok(self.ledger.exists(E::key_for(id).as_str()).await?)
    }

    /// Streams every entity of kind `E` in identifier order.
    pub async fn scan<E: Entity>(&self) -> Result<EntityStream<E>> {
        let entries = self.ledger.scan_kind(E::KIND).await?;
        Ok(lenient(entries))
    }

    /// Streams the entities of kind `E` matching `selector`.
    pub async fn query<E: Entity>(&self, selector: &Selector) -> Result<EntityStream<E>> {
        let query = selector_for::<E>()
            .all_of(vec![selector.clone()])
            .to_query_string();
        let entries = self.ledger.rich_query(&query).await?;
        Ok(lenient(entries))
    }

    /// Starts a unit of work for one logical invocation.
    pub fn begin(&self) -> UnitOfWork<'_, L> {
        UnitOfWork {
            ledger: &self.ledger,
            batch: WriteBatch::new(),
        }
    }
}

fn lenient<E: Entity>(entries: EntryStream) -> EntityStream<E> {
    Box::pin(entries.filter_map(|item| {
        future::ready(match item {
            Ok(entry) => match codec::decode::<E>(&entry.value) {
                Ok(entity) => Some(Ok(entity)),
                Err(e) => {
                    tracing::warn!(key = %entry.key, error = %e, "Skipping malformed record");
                    None
                }
            },
            Err(e) => Some(Err(DomainError::from(e))),
        })
    }))
}

/// Everything one invocation reads and writes.
///
/// Reads record the version they observed; writes are buffered and only
/// reach the ledger on [`commit`](UnitOfWork::commit), all together.
pub struct UnitOfWork<'a, L: Ledger> {
    ledger: &'a L,
    batch: WriteBatch,
}

impl<L: Ledger> UnitOfWork<'_, L> {
    /// Reference of this invocation, recorded on entities for traceability.
    pub fn tx_ref(&self) -> TxRef {
        self.batch.tx_ref()
    }

    pub async fn load<E: Entity>(&mut self, id: &EntityId) -> Result<Option<E>> {
        let key = E::key_for(id);
        let entry = self.ledger.get(key.as_str()).await?;
        self.batch
            .record_read(key.into_string(), entry.as_ref().map(|e| e.version));
        match entry {
            Some(entry) => Ok(Some(codec::decode(&entry.value)?)),
            None => Ok(None),
        }
    }

    pub async fn require<E: Entity>(&mut self, id: &EntityId) -> Result<E> {
        self.load(id)
            .await?
            .ok_or_else(|| DomainError::not_found(E::KIND, id))
    }

    /// Fails with `AlreadyExists` if a record of kind `E` is stored under `id`.
    pub async fn ensure_absent<E: Entity>(&mut self, id: &EntityId) -> Result<()> {
        let key = E::key_for(id);
        let entry = self.ledger.get(key.as_str()).await?;
        let exists = entry.is_some();
        self.batch
            .record_read(key.into_string(), entry.map(|e| e.version));
        if exists {
            return Err(DomainError::already_exists(E::KIND, id));
        }
        Ok(())
    }

    /// Buffers a put of `entity`.
    pub fn stage<E: Entity>(&mut self, entity: &E) -> Result<()> {
        let bytes = codec::encode(entity)?;
        self.batch.put(entity.key().into_string(), bytes);
        Ok(())
    }

    /// Submits every staged write atomically.
    pub async fn commit(self) -> Result<CommitReceipt> {
        Ok(self.ledger.commit(self.batch).await?)
    }
}
