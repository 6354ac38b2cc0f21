//! Failure and telemetry boundary around one run.
//!
//! Converts whatever escapes the orchestrator into a typed
//! [`SyncOutcome`], reports failures to telemetry and (when permitted) the
//! user, and always clears the foreground progress indicator.

use std::sync::Arc;

use tracing::{Instrument, Span, debug, error, field, info, info_span, warn};
use uuid::Uuid;

use crate::domain::ports::{Notifier, Telemetry};
use crate::domain::progress::ProgressReporter;
use crate::domain::sync_orchestrator::{SyncError, SyncOrchestrator, SyncRunConfig};
use crate::domain::sync_outcome::{RunFailure, SyncOutcome};

/// Runs the orchestrator inside the failure boundary.
pub struct SyncEnvelope {
    orchestrator: SyncOrchestrator,
    telemetry: Arc<dyn Telemetry>,
    notifier: Arc<dyn Notifier>,
}

impl SyncEnvelope {
    /// Wrap `orchestrator`, reporting failures to `telemetry` and `notifier`.
    pub fn new(
        orchestrator: SyncOrchestrator,
        telemetry: Arc<dyn Telemetry>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            orchestrator,
            telemetry,
            notifier,
        }
    }

    /// Execute one run and return its terminal outcome.
    pub async fn run(&self, config: &SyncRunConfig, progress: &ProgressReporter) -> SyncOutcome {
        let run_id = Uuid::new_v4();
        let span = info_span!("sync_run", %run_id, error_class = field::Empty);
        async move {
            let _indicator = IndicatorGuard(progress);
            info!(?config, "synchronisation started");
            match self.orchestrator.run(config, progress).await {
                Ok(summary) => SyncOutcome::Success(summary),
                Err(SyncError::Cancelled) => {
                    info!("synchronisation cancelled");
                    SyncOutcome::Cancelled
                }
                Err(error) => SyncOutcome::Failure(self.report_failure(run_id, &error).await),
            }
        }
        .instrument(span)
        .await
    }

    async fn report_failure(&self, run_id: Uuid, error: &SyncError) -> RunFailure {
        let failure = RunFailure::new(error.class_name(), error.to_string());
        Span::current().record("error_class", error.class_name());
        error!(error_class = error.class_name(), error = %error, "synchronisation failed");

        if let Err(telemetry_error) = self.telemetry.capture_failure(run_id, &failure).await {
            warn!(error = %telemetry_error, "failed to capture run failure");
        }
        if self.notifier.has_permission() {
            if let Err(notify_error) = self.notifier.notify_error(&failure).await {
                warn!(error = %notify_error, "failed to deliver error notification");
            }
        } else {
            debug!("notification permission missing; error notification suppressed");
        }
        failure
    }
}

/// Clears the progress indicator on every exit path, including panics and
/// drops of the run future.
struct IndicatorGuard<'a>(&'a ProgressReporter);

impl Drop for IndicatorGuard<'_> {
    fn drop(&mut self) {
        self.0.clear();
    }
}
