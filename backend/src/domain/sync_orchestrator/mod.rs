//! Top-level driver of one synchronisation run.
//!
//! Stages run sequentially in a fixed order: every account (ledger, then
//! customers, payments, orders, and events), then the membership directory,
//! then associated identities. Account failures are recorded per account;
//! directory and setup failures abort the run.

use std::sync::Arc;

use mockable::Clock;
use tracing::{Instrument, info, info_span, warn};

use crate::domain::ports::Account;
use crate::domain::progress::{ProgressReporter, ProgressStep, SyncCancelled};
use crate::domain::reconciler::{ReconcileOutcome, upsert_all};
use crate::domain::sync_outcome::{AccountOutcome, AccountReport, RunSummary};

mod account;
mod chaining;
mod config;
mod error;
mod ports;

pub use config::SyncRunConfig;
pub use error::SyncError;
pub use ports::{LocalStores, RemoteSources, SyncPorts};

/// Sequences the stages of a run against injected ports.
pub struct SyncOrchestrator {
    ports: SyncPorts,
    clock: Arc<dyn Clock>,
}

impl SyncOrchestrator {
    /// Build an orchestrator over `ports`.
    /// ```rust,ignore
    /// let orchestrator = SyncOrchestrator::new(ports, Arc::new(DefaultClock));
    /// ```
    pub fn new(ports: SyncPorts, clock: Arc<dyn Clock>) -> Self {
        Self { ports, clock }
    }

    /// Execute one run honouring `config`.
    ///
    /// # Errors
    ///
    /// [`SyncError::Cancelled`] when cancelled at a checkpoint. Setup and
    /// directory failures abort with their own variant; account-level
    /// failures are reported in the summary instead.
    pub async fn run(
        &self,
        config: &SyncRunConfig,
        progress: &ProgressReporter,
    ) -> Result<RunSummary, SyncError> {
        let started_at = self.clock.utc();
        progress.step(ProgressStep::Initializing)?;

        let first_run = self.ports.stores.ledgers.list_all().await?.is_empty();
        if first_run {
            info!("local ledger store empty; transaction notifications suppressed this run");
        }

        let accounts = self.ports.credentials.accounts().await?;
        let mut reports = Vec::with_capacity(accounts.len());
        for account in &accounts {
            let span = info_span!("account_sync", account = %account.name);
            let outcome = self
                .sync_account(account, config, first_run, progress)
                .instrument(span)
                .await?;
            reports.push(AccountReport {
                account: account.name.clone(),
                outcome,
            });
        }

        let directory = if config.socios {
            Some(self.sync_directory(progress).await?)
        } else {
            None
        };

        let associated = if config.transactions {
            self.chain_associated(&accounts, progress).await?
        } else {
            Vec::new()
        };

        let summary = RunSummary {
            started_at,
            finished_at: self.clock.utc(),
            first_run,
            accounts: reports,
            directory,
            associated,
        };
        info!(
            accounts = summary.accounts.len(),
            associated = summary.associated.len(),
            "synchronisation finished"
        );
        Ok(summary)
    }

    /// Process one account, turning any non-cancellation failure into a
    /// recorded [`AccountOutcome::Failed`].
    async fn sync_account(
        &self,
        account: &Account,
        config: &SyncRunConfig,
        first_run: bool,
        progress: &ProgressReporter,
    ) -> Result<AccountOutcome, SyncCancelled> {
        match self.run_account_stages(account, config, first_run, progress).await {
            Ok(outcome) => Ok(outcome),
            Err(SyncError::Cancelled) => Err(SyncCancelled),
            Err(error) => {
                warn!(
                    error_class = error.class_name(),
                    error = %error,
                    "account synchronisation failed; continuing with the next account"
                );
                Ok(AccountOutcome::Failed {
                    error: error.to_string(),
                })
            }
        }
    }

    async fn sync_directory(
        &self,
        progress: &ProgressReporter,
    ) -> Result<ReconcileOutcome, SyncError> {
        let span = info_span!("reconcile", kind = "members");
        async {
            progress.step(ProgressStep::SyncSocios)?;
            let members = self.ports.sources.directory.fetch_members().await?;
            let outcome = upsert_all(
                ProgressStep::SyncSocios,
                &members,
                self.ports.stores.members.as_ref(),
                progress,
            )
            .await?;
            Ok::<_, SyncError>(outcome)
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests;
