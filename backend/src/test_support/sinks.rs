//! Recording notification, telemetry, network, and sleep doubles.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use super::lock;
use crate::domain::entities::Transaction;
use crate::domain::ports::{NetworkMonitor, Notifier, NotifierError, Telemetry, TelemetryError};
use crate::domain::sync_outcome::RunFailure;
use crate::domain::RetrySleeper;

/// Notifier remembering every delivery.
pub struct RecordingNotifier {
    permitted: AtomicBool,
    transactions: Mutex<Vec<(String, Transaction)>>,
    errors: Mutex<Vec<RunFailure>>,
}

impl RecordingNotifier {
    /// Notifier whose permission is `permitted`.
    pub fn new(permitted: bool) -> Self {
        Self {
            permitted: AtomicBool::new(permitted),
            transactions: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
        }
    }

    /// Grant or revoke the notification permission.
    pub fn set_permitted(&self, permitted: bool) {
        self.permitted.store(permitted, Ordering::SeqCst);
    }

    /// Transaction notifications delivered so far.
    pub fn transactions(&self) -> Vec<(String, Transaction)> {
        lock(&self.transactions).clone()
    }

    /// Error notifications delivered so far.
    pub fn errors(&self) -> Vec<RunFailure> {
        lock(&self.errors).clone()
    }
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn has_permission(&self) -> bool {
        self.permitted.load(Ordering::SeqCst)
    }

    async fn notify_transaction(
        &self,
        account_name: &str,
        transaction: &Transaction,
    ) -> Result<(), NotifierError> {
        lock(&self.transactions).push((account_name.to_owned(), transaction.clone()));
        Ok(())
    }

    async fn notify_error(&self, failure: &RunFailure) -> Result<(), NotifierError> {
        lock(&self.errors).push(failure.clone());
        Ok(())
    }
}

/// Telemetry sink remembering captured failures.
#[derive(Default)]
pub struct RecordingTelemetry {
    failures: Mutex<Vec<(Uuid, RunFailure)>>,
}

impl RecordingTelemetry {
    /// Failures captured so far.
    pub fn failures(&self) -> Vec<RunFailure> {
        lock(&self.failures)
            .iter()
            .map(|(_, failure)| failure.clone())
            .collect()
    }
}

#[async_trait]
impl Telemetry for RecordingTelemetry {
    async fn capture_failure(
        &self,
        run_id: Uuid,
        failure: &RunFailure,
    ) -> Result<(), TelemetryError> {
        lock(&self.failures).push((run_id, failure.clone()));
        Ok(())
    }
}

/// Network monitor reporting a switchable state and counting probes.
pub struct StaticNetworkMonitor {
    connected: AtomicBool,
    probes: AtomicUsize,
    online_after: Mutex<Option<usize>>,
}

impl StaticNetworkMonitor {
    /// Monitor permanently reporting `connected`.
    pub fn new(connected: bool) -> Self {
        Self {
            connected: AtomicBool::new(connected),
            probes: AtomicUsize::new(0),
            online_after: Mutex::new(None),
        }
    }

    /// Monitor reporting offline for the first `probes` probes, then online.
    pub fn online_after(probes: usize) -> Self {
        let monitor = Self::new(false);
        *lock(&monitor.online_after) = Some(probes);
        monitor
    }

    /// Switch the reported state.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Number of probes so far.
    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NetworkMonitor for StaticNetworkMonitor {
    async fn is_connected(&self) -> bool {
        let probe = self.probes.fetch_add(1, Ordering::SeqCst);
        if let Some(threshold) = *lock(&self.online_after) {
            return probe >= threshold;
        }
        self.connected.load(Ordering::SeqCst)
    }
}

/// Sleeper that returns immediately and records requested delays.
#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    /// Delays requested so far.
    pub fn delays(&self) -> Vec<Duration> {
        lock(&self.delays).clone()
    }
}

#[async_trait]
impl RetrySleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        lock(&self.delays).push(duration);
        tokio::task::yield_now().await;
    }
}
