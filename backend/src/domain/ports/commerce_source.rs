//! Driven port for the commerce REST backend.
//!
//! Every call returns the complete, authoritative collection; the reconciler
//! relies on that to prune records removed upstream.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::entities::{Customer, Event, Order, PaymentMethod};

/// Callback receiving `(current, total)` page progress while events load.
pub type FetchProgress<'a> = &'a (dyn Fn(usize, usize) + Send + Sync);

define_port_error! {
    /// Errors surfaced while calling the commerce backend.
    pub enum CommerceSourceError {
        /// Network transport failed before receiving a response.
        Transport { message: String } =>
            "commerce transport failed: {message}",
        /// Backend answered with a non-success status.
        Status { status: u16, message: String } =>
            "commerce backend responded with status {status}: {message}",
        /// Response could not be decoded.
        Decode { message: String } =>
            "commerce payload decode failed: {message}",
    }
}

/// Port for listing commerce collections.
#[async_trait]
pub trait CommerceSource: Send + Sync {
    /// List every customer.
    async fn fetch_customers(&self) -> Result<Vec<Customer>, CommerceSourceError>;

    /// List every payment method.
    async fn fetch_payments(&self) -> Result<Vec<PaymentMethod>, CommerceSourceError>;

    /// List orders, restricted to `customer_id` when given.
    async fn fetch_orders(
        &self,
        customer_id: Option<i64>,
    ) -> Result<Vec<Order>, CommerceSourceError>;

    /// List every event, reporting page progress through `on_progress`.
    async fn fetch_events(
        &self,
        on_progress: FetchProgress<'_>,
    ) -> Result<Vec<Event>, CommerceSourceError>;
}

/// Fixture implementation returning empty collections.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureCommerceSource;

#[async_trait]
impl CommerceSource for FixtureCommerceSource {
    async fn fetch_customers(&self) -> Result<Vec<Customer>, CommerceSourceError> {
        Ok(Vec::new())
    }

    async fn fetch_payments(&self) -> Result<Vec<PaymentMethod>, CommerceSourceError> {
        Ok(Vec::new())
    }

    async fn fetch_orders(
        &self,
        _customer_id: Option<i64>,
    ) -> Result<Vec<Order>, CommerceSourceError> {
        Ok(Vec::new())
    }

    async fn fetch_events(
        &self,
        _on_progress: FetchProgress<'_>,
    ) -> Result<Vec<Event>, CommerceSourceError> {
        Ok(Vec::new())
    }
}
