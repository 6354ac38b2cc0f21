//! Typed results published at the end of a run.
//!
//! Per-account and per-associated-identity problems are recorded here as
//! data instead of aborting the run; only failures escaping the documented
//! boundaries become a [`SyncOutcome::Failure`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::reconciler::ReconcileOutcome;

/// Structured failure surfaced to the run's caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunFailure {
    /// Stable name of the failure class.
    pub error_class: String,
    /// Human-readable failure message.
    pub message: String,
}

impl RunFailure {
    /// Build a failure from its class and message.
    pub fn new(error_class: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_class: error_class.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Exception: {}\nMessage: {}", self.error_class, self.message)
    }
}

/// Terminal result of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Every stage that ran completed, possibly with isolated skips.
    Success(RunSummary),
    /// A failure escaped to the run boundary.
    Failure(RunFailure),
    /// The run was cancelled; stages completed before that stay committed.
    Cancelled,
}

impl SyncOutcome {
    /// Whether the run completed.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Summary of a successful run.
    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            Self::Success(summary) => Some(summary),
            Self::Failure(_) | Self::Cancelled => None,
        }
    }

    /// Failure of a failed run.
    pub fn failure(&self) -> Option<&RunFailure> {
        match self {
            Self::Failure(failure) => Some(failure),
            Self::Success(_) | Self::Cancelled => None,
        }
    }
}

/// What one successful run did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
    /// Whether the local ledger store was empty when the run started.
    pub first_run: bool,
    /// Per-account results, in credential store order.
    pub accounts: Vec<AccountReport>,
    /// Directory upsert counts, when the directory stage ran.
    pub directory: Option<ReconcileOutcome>,
    /// Per-associated-identity results, when chaining ran.
    pub associated: Vec<AssociatedReport>,
}

/// Result of processing one local account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountReport {
    /// Account name.
    pub account: String,
    /// What happened to it.
    pub outcome: AccountOutcome,
}

/// Account-level result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AccountOutcome {
    /// Every enabled stage ran.
    Synced(AccountStages),
    /// The account was not processed.
    Skipped {
        /// Why it was skipped.
        reason: AccountSkipReason,
    },
    /// A stage failed; later stages of this account did not run.
    Failed {
        /// Failure message.
        error: String,
    },
}

/// Reason an account was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountSkipReason {
    /// No cached session token; the stored secret was cleared.
    MissingAuthToken,
}

/// Per-stage results of one account; `None` means the stage did not run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccountStages {
    /// Ledger page sync.
    pub ledger: Option<LedgerOutcome>,
    /// Customers reconciliation.
    pub customers: Option<ReconcileOutcome>,
    /// Payment methods reconciliation.
    pub payments: Option<ReconcileOutcome>,
    /// Orders reconciliation.
    pub orders: Option<ReconcileOutcome>,
    /// Events reconciliation.
    pub events: Option<ReconcileOutcome>,
}

/// Result of syncing one ledger page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LedgerOutcome {
    /// Lines on the page.
    pub transactions: usize,
    /// Lines flipped from un-notified to notified.
    pub newly_notified: usize,
    /// Notifications actually delivered.
    pub notifications_sent: usize,
}

/// Result of chaining into one associated identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssociatedReport {
    /// Directory id of the associated member.
    pub member_id: i64,
    /// Name used as the synthetic account.
    pub member_name: String,
    /// What happened to it.
    pub outcome: AssociatedOutcome,
}

/// Associated-identity result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssociatedOutcome {
    /// Ledger fetched and stored.
    Synced {
        /// Lines on the page.
        transactions: usize,
    },
    /// Not attempted.
    Skipped {
        /// Why it was skipped.
        reason: AssociatedSkipReason,
    },
    /// Login, fetch, parse, or store failed.
    Failed {
        /// Failure message.
        error: String,
    },
}

/// Reason an associated identity was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociatedSkipReason {
    /// The member has no national id to authenticate with.
    MissingNationalId,
}
