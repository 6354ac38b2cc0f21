//! Driven port for failure telemetry.

use async_trait::async_trait;
use uuid::Uuid;

use super::define_port_error;
use crate::domain::sync_outcome::RunFailure;

define_port_error! {
    /// Errors raised while exporting telemetry.
    pub enum TelemetryError {
        /// Exporter could not accept the report.
        Export { message: String } =>
            "telemetry export failed: {message}",
    }
}

/// Port capturing failed runs for later diagnosis.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Telemetry: Send + Sync {
    /// Record that run `run_id` ended with `failure`.
    async fn capture_failure(
        &self,
        run_id: Uuid,
        failure: &RunFailure,
    ) -> Result<(), TelemetryError>;
}
