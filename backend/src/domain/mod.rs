//! Synchronisation domain: entities, ports, and the services driving a run.
//!
//! Nothing here depends on a transport or storage engine; everything
//! external is reached through [`ports`].
//!
//! Public surface:
//! - SyncOrchestrator: sequences the stages of one run.
//! - SyncEnvelope: failure boundary turning a run into a [`SyncOutcome`].
//! - SyncScheduler: coalesces run requests, gates on connectivity, retries.
//! - ProgressReporter: publishes progress and observes cancellation.

pub mod entities;
pub mod identity;
pub mod ports;
pub mod progress;
pub mod reconciler;
pub mod sync_envelope;
pub mod sync_orchestrator;
pub mod sync_outcome;
pub mod sync_scheduler;

pub use self::progress::{
    ProgressReporter, ProgressState, ProgressStep, StepFraction, SyncCancelled,
};
pub use self::reconciler::{ReconcileError, ReconcileOutcome, UpsertAction};
pub use self::sync_envelope::SyncEnvelope;
pub use self::sync_orchestrator::{
    LocalStores, RemoteSources, SyncError, SyncOrchestrator, SyncPorts, SyncRunConfig,
};
pub use self::sync_outcome::{
    AccountOutcome, AccountReport, AccountSkipReason, AccountStages, AssociatedOutcome,
    AssociatedReport, AssociatedSkipReason, LedgerOutcome, RunFailure, RunSummary, SyncOutcome,
};
pub use self::sync_scheduler::{
    RetrySleeper, RunTicket, SchedulerConfig, SchedulerError, SchedulerRuntime, SyncScheduler,
    TickDecision, TokioSleeper,
};
