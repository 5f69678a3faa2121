//! Registration and lifecycle of providers and customers.

use std::sync::Arc;

use common::EntityId;
use ledger::Ledger;

use crate::clock::{Clock, SystemClock};
use crate::error::{Result, ValidationError};
use crate::repository::Repository;
use crate::value_objects::{TransportMode, Visibility};

use super::{
    Customer, Provider, RegisterCustomer, RegisterProvider, UpdateCustomerVisibility,
    UpdateProviderRating,
};

/// Service for managing providers and customers.
pub struct DirectoryService<L: Ledger> {
    repo: Repository<L>,
    clock: Arc<dyn Clock>,
}

impl<L: Ledger> DirectoryService<L> {
    /// Creates a new directory service using the system clock.
    pub fn new(ledger: L) -> Self {
        Self::with_clock(ledger, Arc::new(SystemClock))
    }

    pub fn with_clock(ledger: L, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo: Repository::new(ledger),
            clock,
        }
    }

    /// Registers a provider. Fails on a duplicate id or an unknown transport mode.
    #[tracing::instrument(skip(self, cmd), fields(provider_id = %cmd.id))]
    pub async fn register_provider(&self, cmd: RegisterProvider) -> Result<Provider> {
        require(&cmd.id, "provider id")?;
        if cmd.name.trim().is_empty() {
            return Err(ValidationError::Required { field: "name" }.into());
        }
        let mode: TransportMode = cmd.transport_mode.parse()?;

        let mut uow = self.repo.begin();
        uow.ensure_absent::<Provider>(&cmd.id).await?;

        let mut provider = Provider::new(cmd.id, cmd.name, mode, self.clock.now());
        provider.email = cmd.email;
        provider.phone = cmd.phone;
        provider.attributes = cmd.attributes;

        uow.stage(&provider)?;
        uow.commit().await?;

        metrics::counter!("providers_registered_total").increment(1);
        tracing::info!(provider_id = %provider.id, mode = %provider.transport_mode, "Provider registered");
        Ok(provider)
    }

    /// Soft-deletes a provider. Its tickets are left untouched.
    #[tracing::instrument(skip(self))]
    pub async fn deregister_provider(&self, provider_id: &EntityId) -> Result<Provider> {
        let mut uow = self.repo.begin();
        let mut provider: Provider = uow.require(provider_id).await?;

        if provider.deactivate() {
            uow.stage(&provider)?;
            uow.commit().await?;
            tracing::info!(provider_id = %provider.id, "Provider deregistered");
        }
        Ok(provider)
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_provider_rating(&self, cmd: UpdateProviderRating) -> Result<Provider> {
        if !(0.0..=super::provider::MAX_RATING).contains(&cmd.rating) {
            return Err(ValidationError::InvalidRating(cmd.rating).into());
        }

        let mut uow = self.repo.begin();
        let mut provider: Provider = uow.require(&cmd.provider_id).await?;
        provider.record_rating(cmd.rating)?;

        uow.stage(&provider)?;
        uow.commit().await?;

        tracing::info!(
            provider_id = %provider.id,
            rating = provider.rating,
            total_ratings = provider.total_ratings,
            "Provider rated"
        );
        Ok(provider)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_provider(&self, provider_id: &EntityId) -> Result<Provider> {
        self.repo.require(provider_id).await
    }

    pub async fn provider_exists(&self, provider_id: &EntityId) -> Result<bool> {
        self.repo.exists::<Provider>(provider_id).await
    }

    /// Registers a customer. Fails on a duplicate id or an unknown visibility.
    #[tracing::instrument(skip(self, cmd), fields(customer_id = %cmd.id))]
    pub async fn register_customer(&self, cmd: RegisterCustomer) -> Result<Customer> {
        require(&cmd.id, "customer id")?;
        if cmd.name.trim().is_empty() {
            return Err(ValidationError::Required { field: "name" }.into());
        }
        let visibility: Visibility = cmd.visibility.parse()?;

        let mut uow = self.repo.begin();
        uow.ensure_absent::<Customer>(&cmd.id).await?;

        let mut customer = Customer::new(cmd.id, cmd.name, visibility, self.clock.now());
        customer.email = cmd.email;
        customer.phone = cmd.phone;
        customer.attributes = cmd.attributes;

        uow.stage(&customer)?;
        uow.commit().await?;

        metrics::counter!("customers_registered_total").increment(1);
        tracing::info!(customer_id = %customer.id, "Customer registered");
        Ok(customer)
    }

    /// Soft-deletes a customer. Outstanding bookings are left untouched.
    #[tracing::instrument(skip(self))]
    pub async fn deregister_customer(&self, customer_id: &EntityId) -> Result<Customer> {
        let mut uow = self.repo.begin();
        let mut customer: Customer = uow.require(customer_id).await?;

        if customer.deactivate() {
            uow.stage(&customer)?;
            uow.commit().await?;
            tracing::info!(customer_id = %customer.id, "Customer deregistered");
        }
        Ok(customer)
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_customer_visibility(
        &self,
        cmd: UpdateCustomerVisibility,
    ) -> Result<Customer> {
        let visibility: Visibility = cmd.visibility.parse()?;

        let mut uow = self.repo.begin();
        let mut customer: Customer = uow.require(&cmd.customer_id).await?;
        customer.visibility = visibility;

        uow.stage(&customer)?;
        uow.commit().await?;
        Ok(customer)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_customer(&self, customer_id: &EntityId) -> Result<Customer> {
        self.repo.require(customer_id).await
    }

    pub async fn customer_exists(&self, customer_id: &EntityId) -> Result<bool> {
        self.repo.exists::<Customer>(customer_id).await
    }
}

pub(crate) fn require(id: &EntityId, field: &'static str) -> Result<()> {
    if id.is_blank() {
        return Err(ValidationError::Required { field }.into());
    }
    Ok(())
}
