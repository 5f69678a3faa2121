//! Directory commands.

use std::collections::BTreeMap;

use common::EntityId;
use serde_json::Value;

/// Command to register a new provider.
#[derive(Debug, Clone, Default)]
pub struct RegisterProvider {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    pub phone: String,

    /// Wire form of the transport mode (`air`, `land` or `water`).
    pub transport_mode: String,

    /// Free-form extra fields kept alongside the record.
    pub attributes: BTreeMap<String, Value>,
}

impl RegisterProvider {
    pub fn new(
        id: impl Into<EntityId>,
        name: impl Into<String>,
        transport_mode: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            transport_mode: transport_mode.into(),
            ..Self::default()
        }
    }

    pub fn with_contact(mut self, email: impl Into<String>, phone: impl Into<String>) -> Self {
        self.email = email.into();
        self.phone = phone.into();
        self
    }
}

/// Command to register a new customer.
#[derive(Debug, Clone, Default)]
pub struct RegisterCustomer {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    pub phone: String,

    /// Wire form of the visibility (`public` or `anonymous`).
    pub visibility: String,

    pub attributes: BTreeMap<String, Value>,
}

impl RegisterCustomer {
    pub fn new(
        id: impl Into<EntityId>,
        name: impl Into<String>,
        visibility: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            visibility: visibility.into(),
            ..Self::default()
        }
    }

    pub fn with_contact(mut self, email: impl Into<String>, phone: impl Into<String>) -> Self {
        self.email = email.into();
        self.phone = phone.into();
        self
    }
}

/// Command to fold a new rating into a provider's average.
#[derive(Debug, Clone)]
pub struct UpdateProviderRating {
    pub provider_id: EntityId,
    pub rating: f64,
}

impl UpdateProviderRating {
    pub fn new(provider_id: impl Into<EntityId>, rating: f64) -> Self {
        Self {
            provider_id: provider_id.into(),
            rating,
        }
    }
}

/// Command to change a customer's profile visibility.
#[derive(Debug, Clone)]
pub struct UpdateCustomerVisibility {
    pub customer_id: EntityId,
    pub visibility: String,
}

impl UpdateCustomerVisibility {
    pub fn new(customer_id: impl Into<EntityId>, visibility: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            visibility: visibility.into(),
        }
    }
}
