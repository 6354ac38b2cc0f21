//! Owns the single in-flight run and decides when runs start.
//!
//! On-demand requests replace a running synchronisation (cancel, await,
//! restart); periodic ticks keep it and are dropped instead. Each attempt
//! waits for connectivity first, and failed runs are retried with linear
//! backoff.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::domain::ports::NetworkMonitor;
use crate::domain::progress::{ProgressReporter, ProgressState, SyncCancelled};
use crate::domain::sync_envelope::SyncEnvelope;
use crate::domain::sync_orchestrator::SyncRunConfig;
use crate::domain::sync_outcome::SyncOutcome;

mod runtime;

pub use runtime::{SchedulerRuntime, TokioSleeper};

/// Retry and connectivity policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Maximum run attempts per request (including the first one).
    pub max_attempts: u32,
    /// Backoff unit; attempt `n` waits `initial_backoff * n` before retrying.
    pub initial_backoff: Duration,
    /// How long an attempt waits for connectivity before giving up.
    pub max_offline_wait: Duration,
    /// Delay between connectivity probes while offline.
    pub offline_poll_interval: Duration,
}

impl SchedulerConfig {
    /// Delay applied after failed attempt number `attempt` (1-based).
    ///
    /// ```
    /// use std::time::Duration;
    /// use membership_sync::domain::SchedulerConfig;
    ///
    /// let config = SchedulerConfig {
    ///     initial_backoff: Duration::from_secs(60),
    ///     ..SchedulerConfig::default()
    /// };
    /// assert_eq!(config.backoff_for(3), Duration::from_secs(180));
    /// ```
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.initial_backoff.saturating_mul(attempt.max(1))
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(15 * 60),
            max_offline_wait: Duration::from_secs(30 * 60),
            offline_poll_interval: Duration::from_secs(30),
        }
    }
}

/// Async sleeping abstraction for backoff and offline polling.
#[async_trait]
pub trait RetrySleeper: Send + Sync {
    /// Suspend execution for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Reasons a scheduled run never produced an outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// Connectivity did not come back within the configured bound.
    #[error("network unavailable after waiting {waited:?}")]
    Offline {
        /// Time spent waiting.
        waited: Duration,
    },
    /// The run task stopped without reporting back.
    #[error("scheduled run aborted: {message}")]
    Aborted {
        /// Join failure description.
        message: String,
    },
}

/// Handle on the outcome of one scheduled run.
#[derive(Debug)]
pub struct RunTicket(oneshot::Receiver<Result<SyncOutcome, SchedulerError>>);

impl RunTicket {
    /// Wait for the run to finish.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Offline`] when the run never started for
    /// lack of connectivity, or [`SchedulerError::Aborted`] when the run task
    /// panicked.
    pub async fn outcome(self) -> Result<SyncOutcome, SchedulerError> {
        self.0.await.unwrap_or_else(|_| {
            Err(SchedulerError::Aborted {
                message: "run task dropped its result".to_owned(),
            })
        })
    }
}

/// What a periodic tick did.
#[derive(Debug)]
pub enum TickDecision {
    /// No run was in flight; a new one started.
    Started(RunTicket),
    /// A run was already in flight and keeps running.
    KeptExisting,
}

struct RunHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RunHandle {
    fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

struct SchedulerInner {
    envelope: SyncEnvelope,
    network: Arc<dyn NetworkMonitor>,
    sleeper: Arc<dyn RetrySleeper>,
    config: SchedulerConfig,
    progress: Arc<watch::Sender<ProgressState>>,
}

enum NetworkGate {
    Online,
    Offline(Duration),
    Cancelled,
}

/// Coalesces run requests onto at most one in-flight run.
pub struct SyncScheduler {
    inner: Arc<SchedulerInner>,
    current: Mutex<Option<RunHandle>>,
}

impl SyncScheduler {
    /// Build a scheduler sleeping on the tokio timer.
    pub fn new(
        envelope: SyncEnvelope,
        network: Arc<dyn NetworkMonitor>,
        config: SchedulerConfig,
    ) -> Self {
        Self::with_runtime(envelope, network, SchedulerRuntime::default(), config)
    }

    /// Build a scheduler with injected runtime abstractions.
    pub fn with_runtime(
        envelope: SyncEnvelope,
        network: Arc<dyn NetworkMonitor>,
        runtime: SchedulerRuntime,
        config: SchedulerConfig,
    ) -> Self {
        let (progress, _receiver) = ProgressReporter::channel();
        Self {
            inner: Arc::new(SchedulerInner {
                envelope,
                network,
                sleeper: runtime.sleeper,
                config,
                progress,
            }),
            current: Mutex::new(None),
        }
    }

    /// Progress published by every run this scheduler starts.
    pub fn subscribe(&self) -> watch::Receiver<ProgressState> {
        self.inner.progress.subscribe()
    }

    /// Whether a run is currently in flight.
    pub async fn is_running(&self) -> bool {
        self.current
            .lock()
            .await
            .as_ref()
            .is_some_and(RunHandle::is_active)
    }

    /// Start a run now, cancelling and awaiting any run already in flight.
    pub async fn request_run(&self, run_config: SyncRunConfig) -> RunTicket {
        let mut current = self.current.lock().await;
        if let Some(previous) = current.take() {
            if previous.is_active() {
                info!("replacing in-flight synchronisation");
            }
            stop(previous).await;
        }
        self.spawn(&mut current, run_config)
    }

    /// Start a run unless one is already in flight.
    pub async fn periodic_tick(&self, run_config: SyncRunConfig) -> TickDecision {
        let mut current = self.current.lock().await;
        if current.as_ref().is_some_and(RunHandle::is_active) {
            debug!("synchronisation in flight; periodic tick dropped");
            return TickDecision::KeptExisting;
        }
        TickDecision::Started(self.spawn(&mut current, run_config))
    }

    /// Cancel the in-flight run, if any, and wait for it to stop.
    pub async fn cancel_current(&self) {
        let previous = self.current.lock().await.take();
        if let Some(handle) = previous {
            stop(handle).await;
        }
    }

    /// Tick every `every` until `shutdown` fires, then stop the in-flight run.
    pub async fn run_periodic(
        &self,
        every: Duration,
        run_config: SyncRunConfig,
        shutdown: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = every.as_secs(), "periodic synchronisation enabled");
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if let TickDecision::Started(_) = self.periodic_tick(run_config.clone()).await {
                        debug!("periodic synchronisation started");
                    }
                }
            }
        }
        self.cancel_current().await;
        info!("periodic synchronisation stopped");
    }

    fn spawn(&self, slot: &mut Option<RunHandle>, run_config: SyncRunConfig) -> RunTicket {
        let cancel = CancellationToken::new();
        let (sender, receiver) = oneshot::channel();
        let inner = Arc::clone(&self.inner);
        let token = cancel.clone();
        let task = tokio::spawn(
            async move {
                let result = inner.execute(&run_config, &token).await;
                if sender.send(result).is_err() {
                    debug!("run outcome discarded; ticket dropped");
                }
            }
            .instrument(info_span!("scheduled_sync")),
        );
        *slot = Some(RunHandle { cancel, task });
        RunTicket(receiver)
    }
}

async fn stop(handle: RunHandle) {
    handle.cancel.cancel();
    if let Err(join_error) = handle.task.await {
        warn!(error = %join_error, "previous synchronisation ended abnormally");
    }
}

impl SchedulerInner {
    async fn execute(
        &self,
        run_config: &SyncRunConfig,
        cancel: &CancellationToken,
    ) -> Result<SyncOutcome, SchedulerError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.await_network(cancel).await {
                NetworkGate::Online => {}
                NetworkGate::Cancelled => return Ok(SyncOutcome::Cancelled),
                NetworkGate::Offline(waited) => {
                    warn!(waited_secs = waited.as_secs(), "network unavailable; run abandoned");
                    return Err(SchedulerError::Offline { waited });
                }
            }

            let progress = ProgressReporter::new(Arc::clone(&self.progress), cancel.clone());
            let outcome = self
                .envelope
                .run(run_config, &progress)
                .instrument(info_span!("sync_attempt", attempt))
                .await;

            match outcome {
                SyncOutcome::Failure(failure) if attempt < max_attempts => {
                    let delay = self.config.backoff_for(attempt);
                    warn!(
                        attempt,
                        error_class = %failure.error_class,
                        delay_secs = delay.as_secs(),
                        "synchronisation failed; retrying"
                    );
                    if self.pause(delay, cancel).await.is_err() {
                        return Ok(SyncOutcome::Cancelled);
                    }
                    attempt += 1;
                }
                outcome => return Ok(outcome),
            }
        }
    }

    async fn await_network(&self, cancel: &CancellationToken) -> NetworkGate {
        let limit = self.config.max_offline_wait;
        let mut waited = Duration::ZERO;
        loop {
            if cancel.is_cancelled() {
                return NetworkGate::Cancelled;
            }
            if self.network.is_connected().await {
                return NetworkGate::Online;
            }
            if waited >= limit {
                return NetworkGate::Offline(waited);
            }
            let delay = self
                .config
                .offline_poll_interval
                .min(limit - waited)
                .max(Duration::from_millis(1));
            debug!(waited_secs = waited.as_secs(), "offline; waiting for connectivity");
            if self.pause(delay, cancel).await.is_err() {
                return NetworkGate::Cancelled;
            }
            waited += delay;
        }
    }

    async fn pause(
        &self,
        delay: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), SyncCancelled> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(SyncCancelled),
            () = self.sleeper.sleep(delay) => Ok(()),
        }
    }
}
