//! Stepped, cancellable progress signal for a synchronisation run.
//!
//! Progress is published on a `tokio::sync::watch` channel so observers only
//! ever see the latest state. Every checkpoint is also a cancellation point:
//! once the run's token is cancelled the next checkpoint fails with
//! [`SyncCancelled`] and nothing further is published for that run.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Named phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressStep {
    /// Run setup before any stage.
    Initializing,
    /// Commerce customers.
    SyncCustomers,
    /// Commerce orders.
    SyncOrders,
    /// Commerce events.
    SyncEvents,
    /// Commerce payment methods.
    SyncPayments,
    /// Personal ledgers, including associated identities.
    SyncTransactions,
    /// Membership directory.
    SyncSocios,
    /// Between stages; progress is indeterminate.
    Intermediate,
}

impl ProgressStep {
    /// Stable step identifier published to observers.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initializing => "INITIALIZING",
            Self::SyncCustomers => "SYNC_CUSTOMERS",
            Self::SyncOrders => "SYNC_ORDERS",
            Self::SyncEvents => "SYNC_EVENTS",
            Self::SyncPayments => "SYNC_PAYMENTS",
            Self::SyncTransactions => "SYNC_TRANSACTIONS",
            Self::SyncSocios => "SYNC_SOCIOS",
            Self::Intermediate => "INTERMEDIATE",
        }
    }
}

impl fmt::Display for ProgressStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position within the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepFraction {
    /// Zero-based index of the item being processed.
    pub current: usize,
    /// Number of items in the step.
    pub total: usize,
}

impl StepFraction {
    /// Build a fraction from an index and a total.
    pub const fn new(current: usize, total: usize) -> Self {
        Self { current, total }
    }

    /// Completed share in `[0, 1]`, or `None` when the step is empty.
    ///
    /// # Examples
    /// ```
    /// use membership_sync::domain::StepFraction;
    ///
    /// assert_eq!(StepFraction::new(1, 4).ratio(), Some(0.25));
    /// assert_eq!(StepFraction::new(0, 0).ratio(), None);
    /// ```
    #[expect(
        clippy::cast_precision_loss,
        clippy::float_arithmetic,
        reason = "progress ratios are display-only"
    )]
    pub fn ratio(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some(self.current as f64 / self.total as f64)
    }
}

/// Latest progress published for the foreground indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProgressState {
    /// No run in flight; the indicator is hidden.
    #[default]
    Idle,
    /// A run is executing `step`.
    Running {
        /// Step being executed.
        step: ProgressStep,
        /// Position within the step; `None` means indeterminate.
        fraction: Option<StepFraction>,
    },
}

/// Returned by a checkpoint once the run has been cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("synchronisation cancelled")]
pub struct SyncCancelled;

/// Publishes progress for one run and observes its cancellation token.
pub struct ProgressReporter {
    sender: Arc<watch::Sender<ProgressState>>,
    cancel: CancellationToken,
}

impl ProgressReporter {
    /// Create a progress channel shared by consecutive runs.
    pub fn channel() -> (Arc<watch::Sender<ProgressState>>, watch::Receiver<ProgressState>) {
        let (sender, receiver) = watch::channel(ProgressState::Idle);
        (Arc::new(sender), receiver)
    }

    /// Build a reporter publishing on `sender` and observing `cancel`.
    pub fn new(sender: Arc<watch::Sender<ProgressState>>, cancel: CancellationToken) -> Self {
        Self { sender, cancel }
    }

    /// Build a reporter with its own channel and a fresh token.
    pub fn detached() -> Self {
        let (sender, _receiver) = Self::channel();
        Self::new(sender, CancellationToken::new())
    }

    /// Subscribe to the published progress.
    pub fn subscribe(&self) -> watch::Receiver<ProgressState> {
        self.sender.subscribe()
    }

    /// Token cancelling this run.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whether the run has been asked to stop.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Publish `step` and `fraction` unless the run has been cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`SyncCancelled`] once the token has been cancelled.
    ///
    /// # Examples
    /// ```
    /// use membership_sync::domain::{ProgressReporter, ProgressState, ProgressStep};
    ///
    /// let reporter = ProgressReporter::detached();
    /// let observer = reporter.subscribe();
    /// reporter.step(ProgressStep::SyncSocios).expect("not cancelled");
    /// assert_eq!(
    ///     *observer.borrow(),
    ///     ProgressState::Running { step: ProgressStep::SyncSocios, fraction: None },
    /// );
    ///
    /// reporter.cancellation().cancel();
    /// assert!(reporter.step(ProgressStep::Intermediate).is_err());
    /// ```
    pub fn checkpoint(
        &self,
        step: ProgressStep,
        fraction: Option<StepFraction>,
    ) -> Result<(), SyncCancelled> {
        if self.cancel.is_cancelled() {
            return Err(SyncCancelled);
        }
        self.publish(step, fraction);
        Ok(())
    }

    /// Indeterminate checkpoint for `step`.
    pub fn step(&self, step: ProgressStep) -> Result<(), SyncCancelled> {
        self.checkpoint(step, None)
    }

    /// Checkpoint for item `index` of `total` within `step`.
    pub fn item(&self, step: ProgressStep, index: usize, total: usize) -> Result<(), SyncCancelled> {
        self.checkpoint(step, Some(StepFraction::new(index, total)))
    }

    /// Checkpoint between stages.
    pub fn intermediate(&self) -> Result<(), SyncCancelled> {
        self.checkpoint(ProgressStep::Intermediate, None)
    }

    /// Publish `step` and `fraction` from a callback that cannot abort its
    /// caller. Updates are dropped once the run has been cancelled; the
    /// caller's next checkpoint reports the cancellation.
    pub fn report(&self, step: ProgressStep, fraction: Option<StepFraction>) {
        if !self.cancel.is_cancelled() {
            self.publish(step, fraction);
        }
    }

    fn publish(&self, step: ProgressStep, fraction: Option<StepFraction>) {
        trace!(
            step = step.as_str(),
            current = fraction.map(|f| f.current),
            total = fraction.map(|f| f.total),
            "sync progress"
        );
        self.sender
            .send_replace(ProgressState::Running { step, fraction });
    }

    /// Hide the foreground indicator.
    pub fn clear(&self) {
        self.sender.send_replace(ProgressState::Idle);
    }
}
