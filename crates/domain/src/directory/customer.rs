use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{EntityId, EntityKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::Entity;
use crate::value_objects::Visibility;

/// A traveller who books tickets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub visibility: Visibility,
    pub registered_date: DateTime<Utc>,
    pub is_active: bool,

    /// Live bookings in the order they were made. Cancelled bookings are removed.
    #[serde(default)]
    pub booking_history: Vec<EntityId>,

    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl Customer {
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        visibility: Visibility,
        registered_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: String::new(),
            phone: String::new(),
            visibility,
            registered_date,
            is_active: true,
            booking_history: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// Marks the customer inactive. Returns false if it already was.
    pub fn deactivate(&mut self) -> bool {
        std::mem::replace(&mut self.is_active, false)
    }

    pub fn add_booking(&mut self, booking_id: EntityId) {
        self.booking_history.push(booking_id);
    }

    /// Removes the first occurrence of `booking_id`. Returns true if one was found.
    pub fn remove_booking(&mut self, booking_id: &EntityId) -> bool {
        match self.booking_history.iter().position(|b| b == booking_id) {
            Some(index) => {
                self.booking_history.remove(index);
                true
            }
            None => false,
        }
    }
}

impl Entity for Customer {
    const KIND: EntityKind = EntityKind::Customer;

    fn id(&self) -> &EntityId {
        &self.id
    }
}
