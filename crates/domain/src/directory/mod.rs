//! Providers and customers.

mod commands;
mod customer;
mod provider;
mod service;

pub use commands::{
    RegisterCustomer, RegisterProvider, UpdateCustomerVisibility, UpdateProviderRating,
};
pub use customer::Customer;
pub use provider::{MAX_RATING, Provider};
pub use service::DirectoryService;
pub(crate) use service::require;
