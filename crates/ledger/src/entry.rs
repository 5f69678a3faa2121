use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque reference to one logical invocation against the ledger.
///
/// Every [`WriteBatch`](crate::WriteBatch) is born with a fresh reference;
/// it is what gets recorded on entities for traceability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxRef(Uuid);

impl TxRef {
    /// Creates a new random transaction reference.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a transaction reference from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TxRef {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TxRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for TxRef {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Version of a key: the commit height of the batch that last wrote it.
///
/// Heights start at 1 and increase by one per committed batch, so a
/// version also orders writes across keys.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the height before any commit (0).
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// A stored key together with its raw bytes and version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub key: String,
    pub value: Vec<u8>,
    pub version: Version,
}

impl LedgerEntry {
    /// Creates a new entry.
    pub fn new(key: impl Into<String>, value: Vec<u8>, version: Version) -> Self {
        Self {
            key: key.into(),
            value,
            version,
        }
    }

    /// Parses the value as a JSON document, if it is one.
    pub fn document(&self) -> Option<serde_json::Value> {
        serde_json::from_slice::<serde_json::Value>(&self.value)
            .ok()
            .filter(serde_json::Value::is_object)
    }
}

/// Outcome of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Reference of the committed invocation.
    pub tx_ref: TxRef,

    /// Height assigned to the batch; every written key now has this version.
    pub height: Version,

    /// Number of puts and deletes applied.
    pub keys_written: usize,

    /// When the batch was applied.
    pub committed_at: DateTime<Utc>,
}
