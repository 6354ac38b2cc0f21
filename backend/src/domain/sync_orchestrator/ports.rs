//! Port bundles required by the orchestrator.

use std::sync::Arc;

use crate::domain::entities::{Customer, Event, Member, Order, PaymentMethod, PersonalLedger};
use crate::domain::ports::{
    CommerceSource, CredentialStore, DirectorySource, EntityStore, LedgerSource, Notifier,
};

/// Local collections written by a run.
#[derive(Clone)]
pub struct LocalStores {
    /// Membership directory.
    pub members: Arc<dyn EntityStore<Member>>,
    /// Personal ledgers keyed by account name.
    pub ledgers: Arc<dyn EntityStore<PersonalLedger>>,
    /// Shop customers.
    pub customers: Arc<dyn EntityStore<Customer>>,
    /// Shop orders.
    pub orders: Arc<dyn EntityStore<Order>>,
    /// Shop events.
    pub events: Arc<dyn EntityStore<Event>>,
    /// Shop payment methods.
    pub payments: Arc<dyn EntityStore<PaymentMethod>>,
}

/// Remote sources read by a run.
#[derive(Clone)]
pub struct RemoteSources {
    /// Ledger website.
    pub ledger: Arc<dyn LedgerSource>,
    /// Membership directory.
    pub directory: Arc<dyn DirectorySource>,
    /// Shop backend.
    pub commerce: Arc<dyn CommerceSource>,
}

/// Everything the orchestrator talks to.
#[derive(Clone)]
pub struct SyncPorts {
    /// Local collections.
    pub stores: LocalStores,
    /// Remote sources.
    pub sources: RemoteSources,
    /// Account credentials and cached values.
    pub credentials: Arc<dyn CredentialStore>,
    /// Transaction notifications.
    pub notifier: Arc<dyn Notifier>,
}

impl SyncPorts {
    /// Build a strongly-typed port bundle.
    pub fn new(
        stores: LocalStores,
        sources: RemoteSources,
        credentials: Arc<dyn CredentialStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            stores,
            sources,
            credentials,
            notifier,
        }
    }
}
