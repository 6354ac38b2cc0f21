//! Runtime dependency bundle for the scheduler.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::RetrySleeper;

/// Runtime helpers used by the retry and offline-wait policy.
pub struct SchedulerRuntime {
    /// Async sleep implementation.
    pub sleeper: Arc<dyn RetrySleeper>,
}

impl Default for SchedulerRuntime {
    fn default() -> Self {
        Self {
            sleeper: Arc::new(TokioSleeper),
        }
    }
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl RetrySleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
