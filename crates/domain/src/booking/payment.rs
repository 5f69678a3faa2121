use chrono::{DateTime, Utc};
use common::{EntityId, EntityKind};
use serde::{Deserialize, Serialize};

use crate::codec::Entity;
use crate::value_objects::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    #[default]
    Confirmed,
}

/// Settlement record of a confirmed booking. Exactly one exists per
/// confirmed booking, under id `payment-<bookingId>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: EntityId,
    pub booking_id: EntityId,
    pub amount: Money,
    pub status: PaymentStatus,

    /// Caller-supplied reference of the settling transaction.
    pub transaction_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Returns the payment id belonging to a booking.
    pub fn id_for(booking_id: &EntityId) -> EntityId {
        EntityId::new(format!("payment-{booking_id}"))
    }

    pub fn confirmed(
        booking_id: EntityId,
        amount: Money,
        transaction_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Self::id_for(&booking_id),
            booking_id,
            amount,
            status: PaymentStatus::Confirmed,
            transaction_id: transaction_id.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for Payment {
    const KIND: EntityKind = EntityKind::Payment;

    fn id(&self) -> &EntityId {
        &self.id
    }
}
