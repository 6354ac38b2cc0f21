//! Fully wired port bundle over in-memory adapters and scripted sources.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use mockable::Clock;

use super::{
    RecordingNotifier, RecordingTelemetry, ScriptedCommerceSource, ScriptedDirectorySource,
    ScriptedLedgerSource,
};
use crate::domain::entities::{Customer, Event, Order, PaymentMethod, StockStatus};
use crate::domain::{RemoteSources, SyncEnvelope, SyncOrchestrator, SyncPorts};
use crate::outbound::credentials::{CredentialRecord, JsonCredentialStore};
use crate::outbound::memory::MemoryStores;

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Instant used by fixtures: 2026-03-01T09:00:00Z.
pub fn fixed_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_772_355_600, 0).unwrap_or_default()
}

/// Everything a run touches, with handles kept for assertions.
pub struct SyncHarness {
    /// Local collections.
    pub stores: MemoryStores,
    /// Account credentials.
    pub credentials: Arc<JsonCredentialStore>,
    /// Ledger site.
    pub ledger: Arc<ScriptedLedgerSource>,
    /// Membership directory.
    pub directory: Arc<ScriptedDirectorySource>,
    /// Shop backend.
    pub commerce: Arc<ScriptedCommerceSource>,
    /// Notification sink.
    pub notifier: Arc<RecordingNotifier>,
    /// Telemetry sink.
    pub telemetry: Arc<RecordingTelemetry>,
}

impl SyncHarness {
    /// Harness with the given accounts and empty remote sources.
    pub fn new(accounts: Vec<CredentialRecord>) -> Self {
        Self {
            stores: MemoryStores::default(),
            credentials: Arc::new(JsonCredentialStore::in_memory(accounts)),
            ledger: Arc::new(ScriptedLedgerSource::default()),
            directory: Arc::new(ScriptedDirectorySource::default()),
            commerce: Arc::new(ScriptedCommerceSource::default()),
            notifier: Arc::new(RecordingNotifier::default()),
            telemetry: Arc::new(RecordingTelemetry::default()),
        }
    }

    /// Use `ledger` as the ledger site.
    #[must_use]
    pub fn with_ledger(mut self, ledger: ScriptedLedgerSource) -> Self {
        self.ledger = Arc::new(ledger);
        self
    }

    /// Use `directory` as the membership directory.
    #[must_use]
    pub fn with_directory(mut self, directory: ScriptedDirectorySource) -> Self {
        self.directory = Arc::new(directory);
        self
    }

    /// Use `commerce` as the shop backend.
    #[must_use]
    pub fn with_commerce(mut self, commerce: ScriptedCommerceSource) -> Self {
        self.commerce = Arc::new(commerce);
        self
    }

    /// Use `notifier` as the notification sink.
    #[must_use]
    pub fn with_notifier(mut self, notifier: RecordingNotifier) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    /// Port bundle over the harness handles.
    pub fn ports(&self) -> SyncPorts {
        SyncPorts::new(
            self.stores.local_stores(),
            RemoteSources {
                ledger: self.ledger.clone(),
                directory: self.directory.clone(),
                commerce: self.commerce.clone(),
            },
            self.credentials.clone(),
            self.notifier.clone(),
        )
    }

    /// Orchestrator over [`Self::ports`] with a fixed clock.
    pub fn orchestrator(&self) -> SyncOrchestrator {
        SyncOrchestrator::new(self.ports(), Arc::new(FixedClock(fixed_time())))
    }

    /// Envelope reporting to the harness sinks.
    pub fn envelope(&self) -> SyncEnvelope {
        SyncEnvelope::new(
            self.orchestrator(),
            self.telemetry.clone(),
            self.notifier.clone(),
        )
    }
}

/// Shop customer fixture.
pub fn customer(id: i64, username: &str, role: &str) -> Customer {
    Customer {
        id,
        username: username.to_owned(),
        email: format!("{}@example.org", username.to_lowercase()),
        first_name: String::new(),
        last_name: String::new(),
        role: role.to_owned(),
    }
}

/// Order fixture placed by `customer_id`.
pub fn order(id: i64, customer_id: i64) -> Order {
    Order {
        id,
        status: "completed".to_owned(),
        currency: "EUR".to_owned(),
        date_created: fixed_time(),
        date_modified: fixed_time(),
        total: 10.0,
        customer_id,
        items: Vec::new(),
    }
}

/// Event fixture.
pub fn event(id: i64, name: &str) -> Event {
    Event {
        id,
        name: name.to_owned(),
        slug: name.to_lowercase().replace(' ', "-"),
        permalink: String::new(),
        date_created: fixed_time(),
        date_modified: fixed_time(),
        description: String::new(),
        short_description: String::new(),
        price: 0.0,
        stock_status: StockStatus::InStock,
        stock_quantity: None,
    }
}

/// Payment method fixture.
pub fn payment(id: &str) -> PaymentMethod {
    PaymentMethod {
        id: id.to_owned(),
        title: id.to_uppercase(),
        description: String::new(),
        enabled: true,
    }
}
