//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Everything the synchronisation engine talks to (remote sources, local
//! storage, credentials, notification and telemetry sinks) is reached
//! through one of these traits.

mod macros;
pub(crate) use macros::define_port_error;

mod commerce_source;
mod credential_store;
mod directory_source;
mod entity_store;
mod ledger_source;
mod network_monitor;
mod notifier;
mod telemetry;

pub use commerce_source::{
    CommerceSource, CommerceSourceError, FetchProgress, FixtureCommerceSource,
};
#[cfg(test)]
pub use credential_store::MockCredentialStore;
pub use credential_store::{
    ACCOUNT_TYPE, Account, CUSTOMER_ADMIN_KEY, CUSTOMER_ID_KEY, CredentialStore,
    CredentialStoreError,
};
#[cfg(test)]
pub use directory_source::MockDirectorySource;
pub use directory_source::{DirectorySource, DirectorySourceError, FixtureDirectorySource};
pub use entity_store::{EntityStore, EntityStoreError};
#[cfg(test)]
pub use ledger_source::MockLedgerSource;
pub use ledger_source::{AuthToken, LedgerPage, LedgerSource, LedgerSourceError};
#[cfg(test)]
pub use network_monitor::MockNetworkMonitor;
pub use network_monitor::NetworkMonitor;
#[cfg(test)]
pub use notifier::MockNotifier;
pub use notifier::{Notifier, NotifierError};
#[cfg(test)]
pub use telemetry::MockTelemetry;
pub use telemetry::{Telemetry, TelemetryError};
