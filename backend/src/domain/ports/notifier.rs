//! Driven port for user-facing notifications.
//!
//! Notifications are best effort: callers log delivery errors and carry on.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::entities::Transaction;
use crate::domain::sync_outcome::RunFailure;

define_port_error! {
    /// Errors raised while delivering a notification.
    pub enum NotifierError {
        /// The notification sink refused or failed the delivery.
        Delivery { message: String } =>
            "notification delivery failed: {message}",
    }
}

/// Port delivering transaction and failure notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Whether the platform currently allows showing notifications.
    fn has_permission(&self) -> bool;

    /// Tell the owner of `account_name` about a new ledger line.
    async fn notify_transaction(
        &self,
        account_name: &str,
        transaction: &Transaction,
    ) -> Result<(), NotifierError>;

    /// Tell the user a synchronisation run failed.
    async fn notify_error(&self, failure: &RunFailure) -> Result<(), NotifierError>;
}
