use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{EntityId, EntityKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::Entity;
use crate::error::ValidationError;
use crate::value_objects::TransportMode;

/// Highest rating a provider can receive.
pub const MAX_RATING: f64 = 5.0;

/// A transport operator that publishes tickets.
///
/// Providers are never deleted; deregistration only clears `is_active`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub transport_mode: TransportMode,

    /// Running average of every rating received, in `[0, 5]`.
    pub rating: f64,
    pub total_ratings: u32,
    pub registered_date: DateTime<Utc>,
    pub is_active: bool,

    /// Tickets created by this provider, oldest first.
    #[serde(default)]
    pub transport_list: Vec<EntityId>,

    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl Provider {
    /// Creates an active provider with no ratings and no tickets.
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        transport_mode: TransportMode,
        registered_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: String::new(),
            phone: String::new(),
            transport_mode,
            rating: 0.0,
            total_ratings: 0,
            registered_date,
            is_active: true,
            transport_list: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// Marks the provider inactive. Returns false if it already was.
    pub fn deactivate(&mut self) -> bool {
        std::mem::replace(&mut self.is_active, false)
    }

    /// Folds one rating into the running average.
    pub fn record_rating(&mut self, rating: f64) -> Result<(), ValidationError> {
        if !(0.0..=MAX_RATING).contains(&rating) {
            return Err(ValidationError::InvalidRating(rating));
        }
        self.total_ratings += 1;
        let n = f64::from(self.total_ratings);
        self.rating = (self.rating * (n - 1.0) + rating) / n;
        Ok(())
    }

    pub fn add_ticket(&mut self, ticket_id: EntityId) {
        self.transport_list.push(ticket_id);
    }
}

impl Entity for Provider {
    const KIND: EntityKind = EntityKind::Provider;

    fn id(&self) -> &EntityId {
        &self.id
    }
}
