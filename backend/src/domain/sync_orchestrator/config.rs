//! Per-run stage switches.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Which stages a run executes. Every stage is enabled by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncRunConfig {
    /// Personal ledgers, including associated identities.
    pub transactions: bool,
    /// Membership directory.
    pub socios: bool,
    /// Shop customers.
    pub customers: bool,
    /// Shop orders.
    pub orders: bool,
    /// Shop events.
    pub events: bool,
    /// Shop payment methods.
    pub payments: bool,
}

impl Default for SyncRunConfig {
    fn default() -> Self {
        Self {
            transactions: true,
            socios: true,
            customers: true,
            orders: true,
            events: true,
            payments: true,
        }
    }
}

impl SyncRunConfig {
    /// Build a config from named switches; absent names stay enabled.
    ///
    /// Unknown names are logged and ignored.
    ///
    /// # Examples
    /// ```
    /// use membership_sync::domain::SyncRunConfig;
    ///
    /// let config = SyncRunConfig::from_flags([("sync_orders", false)]);
    /// assert!(!config.orders);
    /// assert!(config.customers);
    /// ```
    pub fn from_flags<'a, I>(flags: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        let mut config = Self::default();
        for (name, enabled) in flags {
            match name {
                "sync_transactions" => config.transactions = enabled,
                "sync_socios" => config.socios = enabled,
                "sync_customers" => config.customers = enabled,
                "sync_orders" => config.orders = enabled,
                "sync_events" => config.events = enabled,
                "sync_payments" => config.payments = enabled,
                unknown => warn!(flag = unknown, "ignoring unknown sync flag"),
            }
        }
        config
    }
}
