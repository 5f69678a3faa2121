//! Entity codec: JSON records tagged with a `docType` discriminator.
//!
//! Records are JSON objects with camelCase fields. Unknown fields are
//! ignored on decode, so older readers tolerate newer records and the
//! other way round as long as added fields carry `#[serde(default)]`.

use common::{EntityId, EntityKind, LedgerKey};
use ledger::Selector;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::CodecError;

/// Field carrying the record kind.
pub const DOC_TYPE: &str = "docType";

/// A record stored in the ledger under its own key.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &EntityId;

    /// Returns the ledger key of this entity.
    fn key(&self) -> LedgerKey {
        LedgerKey::new(Self::KIND, self.id())
    }

    /// Returns the ledger key for an entity of this kind with `id`.
    fn key_for(id: &EntityId) -> LedgerKey {
        LedgerKey::new(Self::KIND, id)
    }
}

/// Serializes an entity, injecting its `docType`.
pub fn encode<E: Entity>(entity: &E) -> Result<Vec<u8>, CodecError> {
    let mut value = serde_json::to_value(entity)?;
    let Value::Object(fields) = &mut value else {
        return Err(CodecError::NotAnObject);
    };
    fields.insert(DOC_TYPE.to_string(), Value::from(E::KIND.as_str()));
    Ok(serde_json::to_vec(&value)?)
}

/// Deserializes a record, checking that it is of kind `E`.
pub fn decode<E: Entity>(bytes: &[u8]) -> Result<E, CodecError> {
    let value: Value = serde_json::from_slice(bytes)?;
    match value.get(DOC_TYPE).and_then(Value::as_str) {
        Some(kind) if kind == E::KIND.as_str() => {}
        found => {
            return Err(CodecError::KindMismatch {
                expected: E::KIND,
                found: found.unwrap_or("<missing>").to_string(),
            });
        }
    }
    Ok(serde_json::from_value(value)?)
}

/// A selector restricted to records of kind `E`.
pub fn selector_for<E: Entity>() -> Selector {
    Selector::new().eq(DOC_TYPE, E::KIND.as_str())
}
