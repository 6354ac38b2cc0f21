//! Errors escaping a synchronisation run.

use std::convert::Infallible;

use thiserror::Error;

use crate::domain::ports::{
    CommerceSourceError, CredentialStoreError, DirectorySourceError, EntityStoreError,
    LedgerSourceError,
};
use crate::domain::progress::SyncCancelled;
use crate::domain::reconciler::ReconcileError;

/// Failure of a run or of one of its isolated boundaries.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The run was cancelled at a checkpoint.
    #[error("synchronisation cancelled")]
    Cancelled,
    /// Ledger website failure.
    #[error(transparent)]
    Ledger(#[from] LedgerSourceError),
    /// Membership directory failure.
    #[error(transparent)]
    Directory(#[from] DirectorySourceError),
    /// Shop backend failure.
    #[error(transparent)]
    Commerce(#[from] CommerceSourceError),
    /// Local storage failure.
    #[error(transparent)]
    Store(#[from] EntityStoreError),
    /// Credential store failure.
    #[error(transparent)]
    Credentials(#[from] CredentialStoreError),
    /// No shop customer has the account's secret as username.
    #[error("could not find the logged in customer of account {account}")]
    CustomerNotFound {
        /// Account whose customer is missing.
        account: String,
    },
    /// The account has a session token but no stored secret.
    #[error("account {account} has no stored secret")]
    MissingSecret {
        /// Account lacking the secret.
        account: String,
    },
}

impl SyncError {
    /// Stable name of the failure class, reported with run failures.
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Cancelled => "Cancelled",
            Self::Ledger(_) => "LedgerSourceError",
            Self::Directory(_) => "DirectorySourceError",
            Self::Commerce(_) => "CommerceSourceError",
            Self::Store(_) => "EntityStoreError",
            Self::Credentials(_) => "CredentialStoreError",
            Self::CustomerNotFound { .. } => "CustomerNotFound",
            Self::MissingSecret { .. } => "MissingSecret",
        }
    }

    /// Whether this error only reports cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<SyncCancelled> for SyncError {
    fn from(_: SyncCancelled) -> Self {
        Self::Cancelled
    }
}

impl From<Infallible> for SyncError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

impl<E> From<ReconcileError<E>> for SyncError
where
    SyncError: From<E>,
{
    fn from(error: ReconcileError<E>) -> Self {
        match error {
            ReconcileError::Fetch(error) => error.into(),
            ReconcileError::Store(error) => error.into(),
            ReconcileError::Cancelled(cancelled) => cancelled.into(),
        }
    }
}
