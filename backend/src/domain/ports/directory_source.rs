//! Driven port for the membership directory.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::entities::Member;

define_port_error! {
    /// Errors surfaced while fetching the membership directory.
    pub enum DirectorySourceError {
        /// Network transport failed before receiving a response.
        Transport { message: String } =>
            "directory transport failed: {message}",
        /// Directory responded with an unexpected status.
        Status { status: u16 } =>
            "directory responded with status {status}",
        /// Directory payload could not be decoded.
        Decode { message: String } =>
            "directory payload decode failed: {message}",
    }
}

/// Port returning the complete membership directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectorySource: Send + Sync {
    /// Fetch every member record.
    async fn fetch_members(&self) -> Result<Vec<Member>, DirectorySourceError>;
}

/// Fixture implementation returning an empty directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureDirectorySource;

#[async_trait]
impl DirectorySource for FixtureDirectorySource {
    async fn fetch_members(&self) -> Result<Vec<Member>, DirectorySourceError> {
        Ok(Vec::new())
    }
}
