//! Re-authenticates as each associated member and stores its ledger.

use thiserror::Error;
use tracing::{Instrument, info, info_span, warn};

use crate::domain::entities::{Member, PersonalLedger};
use crate::domain::ports::{
    Account, EntityStore, EntityStoreError, LedgerSource, LedgerSourceError,
};
use crate::domain::progress::{ProgressReporter, SyncCancelled};
use crate::domain::reconciler::upsert_one;
use crate::domain::sync_outcome::{AssociatedOutcome, AssociatedReport, AssociatedSkipReason};

/// Failure syncing one associated identity.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Login, fetch, or parse failed.
    #[error(transparent)]
    Ledger(#[from] LedgerSourceError),
    /// The fetched ledger could not be stored.
    #[error(transparent)]
    Store(#[from] EntityStoreError),
}

/// Fetches and stores the ledgers of associated members.
pub struct AssociatedChainer<'a> {
    source: &'a dyn LedgerSource,
    ledgers: &'a dyn EntityStore<PersonalLedger>,
    progress: &'a ProgressReporter,
}

impl<'a> AssociatedChainer<'a> {
    /// Build a chainer over borrowed ports.
    pub fn new(
        source: &'a dyn LedgerSource,
        ledgers: &'a dyn EntityStore<PersonalLedger>,
        progress: &'a ProgressReporter,
    ) -> Self {
        Self {
            source,
            ledgers,
            progress,
        }
    }

    /// Sync every member of `associated`, isolating failures per member.
    ///
    /// # Errors
    ///
    /// Only [`SyncCancelled`], checked before each member.
    pub async fn chain(
        &self,
        associated: &[Member],
    ) -> Result<Vec<AssociatedReport>, SyncCancelled> {
        let mut reports = Vec::with_capacity(associated.len());
        for member in associated {
            if self.progress.is_cancelled() {
                return Err(SyncCancelled);
            }
            let span = info_span!("associated_sync", member_id = member.id);
            let outcome = self.chain_one(member).instrument(span).await;
            reports.push(AssociatedReport {
                member_id: member.id,
                member_name: member.name.clone(),
                outcome,
            });
        }
        Ok(reports)
    }

    async fn chain_one(&self, member: &Member) -> AssociatedOutcome {
        let Some(national_id) = member.national_id.as_deref() else {
            return AssociatedOutcome::Skipped {
                reason: AssociatedSkipReason::MissingNationalId,
            };
        };
        match self.fetch_and_store(member, national_id).await {
            Ok(transactions) => {
                info!(member = %member.name, transactions, "associated ledger synced");
                AssociatedOutcome::Synced { transactions }
            }
            Err(error) => {
                warn!(member = %member.name, error = %error, "associated ledger sync failed");
                AssociatedOutcome::Failed {
                    error: error.to_string(),
                }
            }
        }
    }

    async fn fetch_and_store(
        &self,
        member: &Member,
        national_id: &str,
    ) -> Result<usize, ChainError> {
        let account = Account::new(member.name.clone());
        let token = self.source.login(&member.name, national_id).await?;
        let page = self.source.fetch_page(&token).await?;
        let mut ledger = self.source.parse(&page, &account)?;
        let stored = self.ledgers.find(&ledger.account_name).await?;
        if let Some(stored) = stored {
            ledger = ledger.carry_notified_from(&stored);
        }
        upsert_one(self.ledgers, &ledger).await?;
        Ok(ledger.transactions.len())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use mockall::predicate::eq;
    use rstest::rstest;

    use super::*;
    use crate::domain::entities::Transaction;
    use crate::domain::ports::{AuthToken, LedgerPage, MockLedgerSource};

    #[derive(Default)]
    struct LedgerMap(Mutex<BTreeMap<String, PersonalLedger>>);

    #[async_trait]
    impl EntityStore<PersonalLedger> for LedgerMap {
        async fn insert(&self, item: &PersonalLedger) -> Result<(), EntityStoreError> {
            let mut map = self.0.lock().expect("ledger mutex");
            if map.contains_key(&item.account_name) {
                return Err(EntityStoreError::unique_conflict(item.account_name.clone()));
            }
            map.insert(item.account_name.clone(), item.clone());
            Ok(())
        }

        async fn update(&self, item: &PersonalLedger) -> Result<(), EntityStoreError> {
            self.0
                .lock()
                .expect("ledger mutex")
                .insert(item.account_name.clone(), item.clone());
            Ok(())
        }

        async fn delete(&self, item: &PersonalLedger) -> Result<(), EntityStoreError> {
            self.0.lock().expect("ledger mutex").remove(&item.account_name);
            Ok(())
        }

        async fn find(&self, id: &String) -> Result<Option<PersonalLedger>, EntityStoreError> {
            Ok(self.0.lock().expect("ledger mutex").get(id).cloned())
        }

        async fn list_all(&self) -> Result<Vec<PersonalLedger>, EntityStoreError> {
            Ok(self.0.lock().expect("ledger mutex").values().cloned().collect())
        }
    }

    fn parse_as_single_line(source: &mut MockLedgerSource) {
        source.expect_fetch_page().returning(|token| Ok(LedgerPage::new(token.as_str())));
        source.expect_parse().returning(|_, account| {
            Ok(PersonalLedger::new(
                account.name.clone(),
                account.account_type.clone(),
                vec![Transaction::incoming(5.0, "quota")],
            ))
        });
    }

    #[rstest]
    #[tokio::test]
    async fn failing_member_does_not_stop_the_next_one() {
        let mut source = MockLedgerSource::new();
        source
            .expect_login()
            .with(eq("Ana"), eq("11111111A"))
            .returning(|_, _| Err(LedgerSourceError::unauthorized("bad password")));
        source
            .expect_login()
            .with(eq("Bea"), eq("22222222B"))
            .returning(|_, _| Ok(AuthToken::new("bea-token")));
        parse_as_single_line(&mut source);
        let ledgers = LedgerMap::default();
        let progress = ProgressReporter::detached();
        let chainer = AssociatedChainer::new(&source, &ledgers, &progress);

        let reports = chainer
            .chain(&[
                Member::new(10, "Ana").with_national_id("11111111A").associated_with(1),
                Member::new(11, "Bea").with_national_id("22222222B").associated_with(1),
            ])
            .await
            .expect("not cancelled");

        assert!(matches!(reports[0].outcome, AssociatedOutcome::Failed { .. }));
        assert_eq!(reports[1].outcome, AssociatedOutcome::Synced { transactions: 1 });
        let stored = ledgers.list_all().await.expect("list");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].account_name, "Bea");
    }

    #[rstest]
    #[tokio::test]
    async fn member_without_national_id_is_skipped_silently() {
        let mut source = MockLedgerSource::new();
        source.expect_login().never();
        let ledgers = LedgerMap::default();
        let progress = ProgressReporter::detached();
        let chainer = AssociatedChainer::new(&source, &ledgers, &progress);

        let reports = chainer
            .chain(&[Member::new(12, "Cris").associated_with(1)])
            .await
            .expect("not cancelled");

        assert_eq!(
            reports[0].outcome,
            AssociatedOutcome::Skipped {
                reason: AssociatedSkipReason::MissingNationalId,
            }
        );
    }

    #[rstest]
    #[tokio::test]
    async fn stored_notified_flags_survive_rechaining() {
        let mut source = MockLedgerSource::new();
        source
            .expect_login()
            .returning(|_, _| Ok(AuthToken::new("token")));
        parse_as_single_line(&mut source);
        let ledgers = LedgerMap::default();
        ledgers
            .insert(&PersonalLedger::new(
                "Bea",
                "member",
                vec![Transaction::incoming(5.0, "quota").mark_notified()],
            ))
            .await
            .expect("seed");
        let progress = ProgressReporter::detached();
        let chainer = AssociatedChainer::new(&source, &ledgers, &progress);

        chainer
            .chain(&[Member::new(11, "Bea").with_national_id("22222222B")])
            .await
            .expect("not cancelled");

        let stored = ledgers.find(&"Bea".to_owned()).await.expect("find");
        assert!(stored.expect("ledger").transactions[0].notified);
    }

    #[rstest]
    #[tokio::test]
    async fn cancellation_stops_before_next_member() {
        let mut source = MockLedgerSource::new();
        source.expect_login().never();
        let ledgers = LedgerMap::default();
        let progress = ProgressReporter::detached();
        progress.cancellation().cancel();
        let chainer = AssociatedChainer::new(&source, &ledgers, &progress);

        let result = chainer
            .chain(&[Member::new(11, "Bea").with_national_id("22222222B")])
            .await;

        assert!(result.is_err());
    }
}
