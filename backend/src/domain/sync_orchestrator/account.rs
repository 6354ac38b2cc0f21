//! Per-account stages: ledger, customers, payments, orders, events.

use tracing::{Instrument, debug, info, info_span, warn};

use super::{SyncError, SyncOrchestrator, SyncRunConfig};
use crate::domain::entities::{Customer, EntityKind};
use crate::domain::ports::{Account, AuthToken, CUSTOMER_ADMIN_KEY, CUSTOMER_ID_KEY};
use crate::domain::progress::{ProgressReporter, ProgressStep, StepFraction};
use crate::domain::reconciler::{ReconcileOutcome, apply_snapshot, reconcile, upsert_one};
use crate::domain::sync_outcome::{
    AccountOutcome, AccountSkipReason, AccountStages, LedgerOutcome,
};

impl SyncOrchestrator {
    pub(super) async fn run_account_stages(
        &self,
        account: &Account,
        config: &SyncRunConfig,
        first_run: bool,
        progress: &ProgressReporter,
    ) -> Result<AccountOutcome, SyncError> {
        let credentials = self.ports.credentials.as_ref();
        let Some(token) = credentials.auth_token(account).await? else {
            warn!("credentials are not valid; clearing stored secret");
            credentials.clear_secret(account).await?;
            return Ok(AccountOutcome::Skipped {
                reason: AccountSkipReason::MissingAuthToken,
            });
        };

        let mut stages = AccountStages::default();
        if config.transactions {
            let ledger = self.sync_ledger(account, &token, first_run, progress).await?;
            stages.ledger = Some(ledger);
        }
        if config.customers {
            stages.customers = Some(self.sync_customers(account, progress).await?);
        }
        if config.payments {
            stages.payments = Some(
                reconcile(
                    ProgressStep::SyncPayments,
                    self.ports.sources.commerce.fetch_payments(),
                    self.ports.stores.payments.as_ref(),
                    progress,
                )
                .await?,
            );
        }
        if config.orders {
            stages.orders = self.sync_orders(account, progress).await?;
        }
        if config.events {
            stages.events = Some(self.sync_events(progress).await?);
        }
        Ok(AccountOutcome::Synced(stages))
    }

    /// Store the account's ledger page and notify its new lines.
    async fn sync_ledger(
        &self,
        account: &Account,
        token: &AuthToken,
        first_run: bool,
        progress: &ProgressReporter,
    ) -> Result<LedgerOutcome, SyncError> {
        progress.step(ProgressStep::SyncTransactions)?;
        let source = self.ports.sources.ledger.as_ref();
        let ledgers = self.ports.stores.ledgers.as_ref();

        let page = source.fetch_page(token).await?;
        let fresh = source.parse(&page, account)?;
        let stored = ledgers.find(&fresh.account_name).await?;
        let mut ledger = match stored {
            Some(stored) => fresh.carry_notified_from(&stored),
            None => fresh,
        };
        upsert_one(ledgers, &ledger).await?;

        let notifier = self.ports.notifier.as_ref();
        let deliver = !first_run && notifier.has_permission();
        let mut outcome = LedgerOutcome {
            transactions: ledger.transactions.len(),
            ..LedgerOutcome::default()
        };
        for transaction in ledger.transactions.iter_mut().filter(|t| !t.notified) {
            if deliver {
                match notifier.notify_transaction(&account.name, transaction).await {
                    Ok(()) => outcome.notifications_sent += 1,
                    Err(error) => warn!(error = %error, "transaction notification failed"),
                }
            }
            transaction.notified = true;
            outcome.newly_notified += 1;
        }
        if outcome.newly_notified > 0 {
            ledgers.update(&ledger).await?;
        }

        debug!(
            transactions = outcome.transactions,
            newly_notified = outcome.newly_notified,
            notifications_sent = outcome.notifications_sent,
            "ledger synchronised"
        );
        progress.intermediate()?;
        Ok(outcome)
    }

    /// Reconcile customers after resolving the account's own customer.
    async fn sync_customers(
        &self,
        account: &Account,
        progress: &ProgressReporter,
    ) -> Result<ReconcileOutcome, SyncError> {
        let span = info_span!("reconcile", kind = %EntityKind::Customers);
        async {
            progress.step(ProgressStep::SyncCustomers)?;
            let customers = self.ports.sources.commerce.fetch_customers().await?;
            self.remember_customer(account, &customers).await?;
            let outcome = apply_snapshot(
                ProgressStep::SyncCustomers,
                customers,
                self.ports.stores.customers.as_ref(),
                progress,
            )
            .await?;
            Ok::<_, SyncError>(outcome)
        }
        .instrument(span)
        .await
    }

    /// Cache the customer id and role of the account, unless already cached.
    async fn remember_customer(
        &self,
        account: &Account,
        customers: &[Customer],
    ) -> Result<(), SyncError> {
        let credentials = self.ports.credentials.as_ref();
        let secret = credentials
            .secret(account)
            .await?
            .ok_or_else(|| SyncError::MissingSecret {
                account: account.name.clone(),
            })?;
        let wanted = secret.to_lowercase();
        let customer = customers
            .iter()
            .find(|customer| customer.username.to_lowercase() == wanted)
            .ok_or_else(|| SyncError::CustomerNotFound {
                account: account.name.clone(),
            })?;

        if credentials.cached_value(account, CUSTOMER_ID_KEY).await?.is_none() {
            info!(customer_id = customer.id, "caching customer id");
            credentials
                .set_cached_value(account, CUSTOMER_ID_KEY, &customer.id.to_string())
                .await?;
        }
        if credentials.cached_value(account, CUSTOMER_ADMIN_KEY).await?.is_none() {
            info!(role = %customer.role, "caching customer role");
            credentials
                .set_cached_value(
                    account,
                    CUSTOMER_ADMIN_KEY,
                    &customer.is_administrator().to_string(),
                )
                .await?;
        }
        Ok(())
    }

    /// Reconcile orders once the account's customer id is known.
    async fn sync_orders(
        &self,
        account: &Account,
        progress: &ProgressReporter,
    ) -> Result<Option<ReconcileOutcome>, SyncError> {
        let credentials = self.ports.credentials.as_ref();
        let customer_id = credentials
            .cached_value(account, CUSTOMER_ID_KEY)
            .await?
            .and_then(|value| value.parse::<i64>().ok());
        let Some(customer_id) = customer_id else {
            debug!("customer id unresolved; orders not fetched");
            return Ok(None);
        };
        let is_admin = credentials
            .cached_value(account, CUSTOMER_ADMIN_KEY)
            .await?
            .and_then(|value| value.parse::<bool>().ok())
            .unwrap_or(false);
        let filter = (!is_admin).then_some(customer_id);

        let outcome = reconcile(
            ProgressStep::SyncOrders,
            self.ports.sources.commerce.fetch_orders(filter),
            self.ports.stores.orders.as_ref(),
            progress,
        )
        .await?;
        Ok(Some(outcome))
    }

    /// Reconcile events, forwarding page progress from the fetch.
    async fn sync_events(
        &self,
        progress: &ProgressReporter,
    ) -> Result<ReconcileOutcome, SyncError> {
        let on_progress = |current: usize, total: usize| {
            progress.report(
                ProgressStep::SyncEvents,
                Some(StepFraction::new(current, total)),
            );
        };
        let outcome = reconcile(
            ProgressStep::SyncEvents,
            self.ports.sources.commerce.fetch_events(&on_progress),
            self.ports.stores.events.as_ref(),
            progress,
        )
        .await?;
        Ok(outcome)
    }
}
