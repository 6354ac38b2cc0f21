//! In-memory local store with JSON snapshot persistence.
//!
//! Each collection lives in its own [`InMemoryEntityStore`]; a
//! [`MemoryStores`] bundle exposes them to the orchestrator and converts
//! to and from a [`LocalSnapshot`] saved between process runs.

mod snapshot;
mod store;

pub use snapshot::{LocalSnapshot, SnapshotError, SnapshotFile};
pub use store::InMemoryEntityStore;

use std::sync::Arc;

use crate::domain::entities::{Customer, Event, Member, Order, PaymentMethod, PersonalLedger};
use crate::domain::LocalStores;

/// Every local collection, backed by memory.
#[derive(Clone, Default)]
pub struct MemoryStores {
    /// Membership directory.
    pub members: Arc<InMemoryEntityStore<Member>>,
    /// Personal ledgers.
    pub ledgers: Arc<InMemoryEntityStore<PersonalLedger>>,
    /// Shop customers.
    pub customers: Arc<InMemoryEntityStore<Customer>>,
    /// Shop orders.
    pub orders: Arc<InMemoryEntityStore<Order>>,
    /// Shop events.
    pub events: Arc<InMemoryEntityStore<Event>>,
    /// Shop payment methods.
    pub payments: Arc<InMemoryEntityStore<PaymentMethod>>,
}

impl MemoryStores {
    /// Populate stores from a saved snapshot.
    pub fn from_snapshot(snapshot: LocalSnapshot) -> Self {
        Self {
            members: Arc::new(InMemoryEntityStore::with_records(snapshot.members)),
            ledgers: Arc::new(InMemoryEntityStore::with_records(snapshot.ledgers)),
            customers: Arc::new(InMemoryEntityStore::with_records(snapshot.customers)),
            orders: Arc::new(InMemoryEntityStore::with_records(snapshot.orders)),
            events: Arc::new(InMemoryEntityStore::with_records(snapshot.events)),
            payments: Arc::new(InMemoryEntityStore::with_records(snapshot.payments)),
        }
    }

    /// Capture the current contents of every store.
    pub async fn snapshot(&self) -> LocalSnapshot {
        LocalSnapshot {
            members: self.members.records().await,
            ledgers: self.ledgers.records().await,
            customers: self.customers.records().await,
            orders: self.orders.records().await,
            events: self.events.records().await,
            payments: self.payments.records().await,
        }
    }

    /// Port view of these stores for the orchestrator.
    pub fn local_stores(&self) -> LocalStores {
        LocalStores {
            members: self.members.clone(),
            ledgers: self.ledgers.clone(),
            customers: self.customers.clone(),
            orders: self.orders.clone(),
            events: self.events.clone(),
            payments: self.payments.clone(),
        }
    }
}
