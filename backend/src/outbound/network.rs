//! Connectivity probe used to gate runs.

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::domain::ports::NetworkMonitor;

/// Reports connectivity by opening a TCP connection to a known host.
#[derive(Debug, Clone)]
pub struct TcpProbeMonitor {
    address: String,
    timeout: Duration,
}

impl TcpProbeMonitor {
    /// Probe `address` (`host:port`), giving up after `timeout`.
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }
}

#[async_trait]
impl NetworkMonitor for TcpProbeMonitor {
    async fn is_connected(&self) -> bool {
        match timeout(self.timeout, TcpStream::connect(self.address.as_str())).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(error)) => {
                debug!(address = %self.address, error = %error, "network probe failed");
                false
            }
            Err(_elapsed) => {
                debug!(address = %self.address, "network probe timed out");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn reachable_listener_counts_as_connected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("address").to_string();

        let monitor = TcpProbeMonitor::new(address, Duration::from_secs(1));

        assert!(monitor.is_connected().await);
    }

    #[tokio::test]
    async fn closed_port_counts_as_offline() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("address").to_string();
        drop(listener);

        let monitor = TcpProbeMonitor::new(address, Duration::from_secs(1));

        assert!(!monitor.is_connected().await);
    }
}
