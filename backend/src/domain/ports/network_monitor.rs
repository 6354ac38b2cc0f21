//! Driven port reporting network availability.

use async_trait::async_trait;

/// Port gating runs on connectivity.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NetworkMonitor: Send + Sync {
    /// Whether remote sources are currently reachable.
    async fn is_connected(&self) -> bool;
}
