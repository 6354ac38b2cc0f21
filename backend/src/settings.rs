//! Runtime configuration loaded via OrthoConfig.
//!
//! Values come from CLI flags, `SYNC_*` environment variables, and config
//! files. Unset optional values fall back to the defaults exposed by the
//! accessor methods.

use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::{SchedulerConfig, SyncRunConfig};

const DEFAULT_CREDENTIALS_PATH: &str = "credentials.json";
const DEFAULT_SNAPSHOT_PATH: &str = "sync-snapshot.json";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;

/// Errors raised while interpreting loaded settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// A configured endpoint is not a valid absolute URL.
    #[error("{field} is not a valid URL: {source}")]
    InvalidUrl {
        /// Setting name.
        field: &'static str,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
}

/// Configuration of the synchronisation binary.
///
/// Stage switches and `notifications` are enabled unless explicitly set to
/// `false`.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SYNC")]
pub struct SyncSettings {
    /// Base URL of the personal ledger website.
    pub ledger_url: Option<String>,
    /// URL serving the membership directory as JSON.
    pub directory_url: Option<String>,
    /// Shop root URL; commerce stages fetch nothing when unset.
    pub shop_url: Option<String>,
    /// Shop API consumer key.
    pub commerce_key: Option<String>,
    /// Shop API consumer secret.
    pub commerce_secret: Option<String>,
    /// JSON credential file.
    pub credentials_path: Option<PathBuf>,
    /// JSON snapshot of the local store.
    pub snapshot_path: Option<PathBuf>,
    /// Fetch personal ledgers and associated identities.
    pub sync_transactions: Option<bool>,
    /// Fetch the membership directory.
    pub sync_socios: Option<bool>,
    /// Fetch shop customers.
    pub sync_customers: Option<bool>,
    /// Fetch shop orders.
    pub sync_orders: Option<bool>,
    /// Fetch shop events.
    pub sync_events: Option<bool>,
    /// Fetch shop payment methods.
    pub sync_payments: Option<bool>,
    /// Deliver transaction and error notices.
    pub notifications: Option<bool>,
    /// Run periodically every this many seconds instead of once.
    pub interval_secs: Option<u64>,
    /// Run attempts per request, including the first.
    pub max_attempts: Option<u32>,
    /// Linear backoff unit between attempts, in seconds.
    pub backoff_secs: Option<u64>,
    /// Longest wait for connectivity before abandoning a run, in seconds.
    pub max_offline_wait_secs: Option<u64>,
    /// Delay between connectivity probes, in seconds.
    pub offline_poll_secs: Option<u64>,
    /// `host:port` probed to decide whether the network is up.
    pub probe_address: Option<String>,
    /// Timeout of each HTTP request, in seconds.
    pub http_timeout_secs: Option<u64>,
}

impl SyncSettings {
    /// Stage flags of each run.
    pub fn run_config(&self) -> SyncRunConfig {
        SyncRunConfig {
            transactions: enabled(self.sync_transactions),
            socios: enabled(self.sync_socios),
            customers: enabled(self.sync_customers),
            orders: enabled(self.sync_orders),
            events: enabled(self.sync_events),
            payments: enabled(self.sync_payments),
        }
    }

    /// Whether transaction and error notices are delivered.
    pub fn notifications(&self) -> bool {
        enabled(self.notifications)
    }

    /// Retry and connectivity policy, defaults filled in.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        let defaults = SchedulerConfig::default();
        SchedulerConfig {
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            initial_backoff: self
                .backoff_secs
                .map_or(defaults.initial_backoff, Duration::from_secs),
            max_offline_wait: self
                .max_offline_wait_secs
                .map_or(defaults.max_offline_wait, Duration::from_secs),
            offline_poll_interval: self
                .offline_poll_secs
                .map_or(defaults.offline_poll_interval, Duration::from_secs),
        }
    }

    /// Periodic interval, or `None` for a single run.
    pub fn periodic_interval(&self) -> Option<Duration> {
        self.interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// HTTP request timeout.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS))
    }

    /// Connectivity probe timeout.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS)
    }

    /// Credential file, falling back to `credentials.json`.
    pub fn credentials_path(&self) -> PathBuf {
        self.credentials_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_PATH))
    }

    /// Snapshot file, falling back to `sync-snapshot.json`.
    pub fn snapshot_path(&self) -> PathBuf {
        self.snapshot_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_PATH))
    }

    /// Parsed ledger website URL.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidUrl`] when the value does not parse.
    pub fn ledger_url(&self) -> Result<Option<Url>, SettingsError> {
        parse_url("ledger_url", self.ledger_url.as_deref())
    }

    /// Parsed membership directory URL.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidUrl`] when the value does not parse.
    pub fn directory_url(&self) -> Result<Option<Url>, SettingsError> {
        parse_url("directory_url", self.directory_url.as_deref())
    }

    /// Parsed shop URL.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidUrl`] when the value does not parse.
    pub fn shop_url(&self) -> Result<Option<Url>, SettingsError> {
        parse_url("shop_url", self.shop_url.as_deref())
    }
}

fn enabled(flag: Option<bool>) -> bool {
    flag.unwrap_or(true)
}

fn parse_url(field: &'static str, value: Option<&str>) -> Result<Option<Url>, SettingsError> {
    value
        .map(|raw| Url::parse(raw).map_err(|source| SettingsError::InvalidUrl { field, source }))
        .transpose()
}
