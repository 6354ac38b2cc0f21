//! Associated identity stage.

use tracing::debug;

use super::{SyncError, SyncOrchestrator};
use crate::domain::identity::{AssociatedChainer, find_member_for_secret, resolve_associated};
use crate::domain::ports::Account;
use crate::domain::progress::{ProgressReporter, ProgressStep};
use crate::domain::sync_outcome::AssociatedReport;

impl SyncOrchestrator {
    /// Fetch the ledgers of members associated with each account's member.
    ///
    /// Members are read from the local directory, so this stage sees the
    /// directory as left by the preceding stage.
    pub(super) async fn chain_associated(
        &self,
        accounts: &[Account],
        progress: &ProgressReporter,
    ) -> Result<Vec<AssociatedReport>, SyncError> {
        progress.step(ProgressStep::SyncTransactions)?;
        let members = self.ports.stores.members.list_all().await?;
        let chainer = AssociatedChainer::new(
            self.ports.sources.ledger.as_ref(),
            self.ports.stores.ledgers.as_ref(),
            progress,
        );

        let mut reports = Vec::new();
        for (index, account) in accounts.iter().enumerate() {
            progress.item(ProgressStep::SyncTransactions, index, accounts.len())?;
            let Some(secret) = self.ports.credentials.secret(account).await? else {
                continue;
            };
            let Some(owner) = find_member_for_secret(&members, &secret) else {
                debug!(account = %account.name, "account has no directory record");
                continue;
            };
            let associated = resolve_associated(&members, owner.id);
            if associated.is_empty() {
                continue;
            }
            debug!(
                account = %account.name,
                member_id = owner.id,
                associated = associated.len(),
                "chaining into associated members"
            );
            reports.extend(chainer.chain(&associated).await?);
        }

        progress.intermediate()?;
        Ok(reports)
    }
}
