use serde::{Deserialize, Serialize};

/// Caller-supplied identifier of a stored entity.
///
/// Identifiers are only unique within their [`EntityKind`]; the ledger key
/// is always derived through [`LedgerKey`] so that a ticket and a booking
/// may share the same identifier without overwriting each other.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Creates an identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the identifier is empty or only whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The kinds of record kept in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Provider,
    Customer,
    Ticket,
    Booking,
    Payment,
}

impl EntityKind {
    /// All kinds, in key-space order.
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Booking,
        EntityKind::Customer,
        EntityKind::Payment,
        EntityKind::Provider,
        EntityKind::Ticket,
    ];

    /// Returns the kind name, used both as key prefix and as `docType`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Provider => "provider",
            EntityKind::Customer => "customer",
            EntityKind::Ticket => "ticket",
            EntityKind::Booking => "booking",
            EntityKind::Payment => "payment",
        }
    }

    /// Parses a kind name as produced by [`EntityKind::as_str`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A ledger key: `<kind>:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LedgerKey(String);

impl LedgerKey {
    const SEPARATOR: char = ':';

    /// Builds the key for an entity of `kind` with identifier `id`.
    pub fn new(kind: EntityKind, id: &EntityId) -> Self {
        Self(format!("{}{}{}", kind.as_str(), Self::SEPARATOR, id.as_str()))
    }

    /// Splits a raw key back into its kind and identifier.
    ///
    /// Returns None for keys outside the entity key space.
    pub fn parse(raw: &str) -> Option<(EntityKind, EntityId)> {
        let (kind, id) = raw.split_once(Self::SEPARATOR)?;
        Some((EntityKind::from_name(kind)?, EntityId::new(id)))
    }

    /// Returns the half-open `[start, end)` range covering every key of `kind`.
    pub fn kind_range(kind: EntityKind) -> (String, String) {
        // ';' sorts immediately after ':'
        (format!("{}:", kind.as_str()), format!("{};", kind.as_str()))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key, returning the owned string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for LedgerKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
