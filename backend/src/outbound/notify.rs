//! Tracing-backed notification and telemetry sinks.
//!
//! The binary has no user-facing notification surface; transaction and
//! failure notices are emitted as structured log events instead.

use async_trait::async_trait;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::entities::{Transaction, TransactionAmount};
use crate::domain::ports::{Notifier, NotifierError, Telemetry, TelemetryError};
use crate::domain::sync_outcome::RunFailure;

/// Notifier writing notices to the log.
#[derive(Debug, Clone, Copy)]
pub struct TracingNotifier {
    permitted: bool,
}

impl TracingNotifier {
    /// Build a notifier; `permitted = false` mimics a denied permission.
    pub fn new(permitted: bool) -> Self {
        Self { permitted }
    }
}

#[async_trait]
impl Notifier for TracingNotifier {
    fn has_permission(&self) -> bool {
        self.permitted
    }

    async fn notify_transaction(
        &self,
        account_name: &str,
        transaction: &Transaction,
    ) -> Result<(), NotifierError> {
        let (direction, amount) = match transaction.amount {
            TransactionAmount::In(amount) => ("in", amount),
            TransactionAmount::Out(amount) => ("out", amount),
        };
        info!(
            target: "membership_sync::notifications",
            account = account_name,
            direction,
            amount,
            description = %transaction.description,
            "new transaction"
        );
        Ok(())
    }

    async fn notify_error(&self, failure: &RunFailure) -> Result<(), NotifierError> {
        error!(
            target: "membership_sync::notifications",
            error_class = %failure.error_class,
            message = %failure.message,
            "synchronisation failed"
        );
        Ok(())
    }
}

/// Telemetry sink recording failures as log events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

#[async_trait]
impl Telemetry for TracingTelemetry {
    async fn capture_failure(
        &self,
        run_id: Uuid,
        failure: &RunFailure,
    ) -> Result<(), TelemetryError> {
        error!(
            target: "membership_sync::telemetry",
            %run_id,
            error_class = %failure.error_class,
            message = %failure.message,
            "run failure captured"
        );
        Ok(())
    }
}
