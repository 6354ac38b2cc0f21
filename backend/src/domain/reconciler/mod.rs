//! Generic fetch, upsert, prune merge for one synchronised collection.
//!
//! The remote fetch is authoritative: after a successful pass the local
//! collection holds exactly the remote ids, each equal to its remote version.
//! A store failure other than a duplicate id stops the pass where it is;
//! items already written stay written.

use std::collections::BTreeSet;
use std::convert::Infallible;
use std::future::Future;

use serde::Serialize;
use thiserror::Error;
use tracing::{Instrument, debug, info, info_span};

use crate::domain::entities::SyncEntity;
use crate::domain::ports::{EntityStore, EntityStoreError};
use crate::domain::progress::{ProgressReporter, ProgressStep, SyncCancelled};

/// Counts describing one reconciliation or upsert pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    /// Items returned by the remote fetch.
    pub fetched: usize,
    /// Items that did not exist locally.
    pub inserted: usize,
    /// Existing items whose stored copy differed from the remote one.
    pub updated: usize,
    /// Existing items already equal to the remote one.
    pub unchanged: usize,
    /// Local items pruned because the remote no longer lists them.
    pub deleted: usize,
}

impl ReconcileOutcome {
    fn record(&mut self, action: UpsertAction) {
        match action {
            UpsertAction::Inserted => self.inserted += 1,
            UpsertAction::Updated => self.updated += 1,
            UpsertAction::Unchanged => self.unchanged += 1,
        }
    }

    /// Number of local writes performed.
    pub fn writes(&self) -> usize {
        self.inserted + self.updated + self.deleted
    }
}

/// Effect of writing one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    /// No record with the item's id existed.
    Inserted,
    /// A differing record was replaced.
    Updated,
    /// The stored record already matched.
    Unchanged,
}

/// Errors aborting a reconciliation pass.
#[derive(Debug, Error)]
pub enum ReconcileError<E> {
    /// The remote fetch failed; nothing local was touched.
    #[error("remote fetch failed: {0}")]
    Fetch(#[source] E),
    /// Local storage failed part way through.
    #[error(transparent)]
    Store(#[from] EntityStoreError),
    /// The run was cancelled at an item or stage checkpoint.
    #[error(transparent)]
    Cancelled(#[from] SyncCancelled),
}

impl ReconcileError<Infallible> {
    /// Re-type an error that cannot carry a fetch failure.
    pub fn widen<E>(self) -> ReconcileError<E> {
        match self {
            Self::Fetch(never) => match never {},
            Self::Store(error) => ReconcileError::Store(error),
            Self::Cancelled(cancelled) => ReconcileError::Cancelled(cancelled),
        }
    }
}

/// Mirror the remote collection returned by `fetch` into `store`.
///
/// Publishes `step` before fetching, one fraction per written item, and an
/// intermediate checkpoint at the end; each of those may observe
/// cancellation.
///
/// # Errors
///
/// [`ReconcileError::Fetch`] when the fetch fails, [`ReconcileError::Store`]
/// when a write other than a duplicate insert fails, and
/// [`ReconcileError::Cancelled`] at the first checkpoint after cancellation.
pub async fn reconcile<T, E, Fut>(
    step: ProgressStep,
    fetch: Fut,
    store: &dyn EntityStore<T>,
    progress: &ProgressReporter,
) -> Result<ReconcileOutcome, ReconcileError<E>>
where
    T: SyncEntity,
    Fut: Future<Output = Result<Vec<T>, E>>,
{
    let span = info_span!("reconcile", kind = %T::KIND);
    async move {
        progress.step(step)?;
        let remote = fetch.await.map_err(ReconcileError::Fetch)?;
        apply_snapshot(step, remote, store, progress)
            .await
            .map_err(|error| error.widen::<E>())
    }
    .instrument(span)
    .await
}

/// Upsert every item of an already fetched `remote` snapshot, then prune.
///
/// # Errors
///
/// See [`reconcile`]; no fetch failure can occur here.
pub async fn apply_snapshot<T: SyncEntity>(
    step: ProgressStep,
    remote: Vec<T>,
    store: &dyn EntityStore<T>,
    progress: &ProgressReporter,
) -> Result<ReconcileOutcome, ReconcileError<Infallible>> {
    let mut outcome = write_all(step, &remote, store, progress).await?;

    let remote_ids: BTreeSet<&T::Id> = remote.iter().map(SyncEntity::id).collect();
    for local in store.list_all().await? {
        if !remote_ids.contains(local.id()) {
            debug!(kind = %T::KIND, id = %local.id(), "pruning record removed upstream");
            store.delete(&local).await?;
            outcome.deleted += 1;
        }
    }

    progress.intermediate()?;
    log_outcome::<T>(&outcome);
    Ok(outcome)
}

/// Upsert every item of `remote` without pruning local extras.
///
/// # Errors
///
/// See [`apply_snapshot`].
pub async fn upsert_all<T: SyncEntity>(
    step: ProgressStep,
    remote: &[T],
    store: &dyn EntityStore<T>,
    progress: &ProgressReporter,
) -> Result<ReconcileOutcome, ReconcileError<Infallible>> {
    let outcome = write_all(step, remote, store, progress).await?;
    progress.intermediate()?;
    log_outcome::<T>(&outcome);
    Ok(outcome)
}

/// Insert `item`, replacing the stored record when its id already exists.
///
/// The replace is skipped when the stored record already equals `item`.
///
/// # Errors
///
/// Any store error except the duplicate-id conflict raised by `insert`.
pub async fn upsert_one<T: SyncEntity>(
    store: &dyn EntityStore<T>,
    item: &T,
) -> Result<UpsertAction, EntityStoreError> {
    match store.insert(item).await {
        Ok(()) => Ok(UpsertAction::Inserted),
        Err(error) if error.is_unique_conflict() => {
            if store.find(item.id()).await?.as_ref() == Some(item) {
                return Ok(UpsertAction::Unchanged);
            }
            store.update(item).await?;
            Ok(UpsertAction::Updated)
        }
        Err(error) => Err(error),
    }
}

async fn write_all<T: SyncEntity>(
    step: ProgressStep,
    remote: &[T],
    store: &dyn EntityStore<T>,
    progress: &ProgressReporter,
) -> Result<ReconcileOutcome, ReconcileError<Infallible>> {
    let total = remote.len();
    let mut outcome = ReconcileOutcome {
        fetched: total,
        ..ReconcileOutcome::default()
    };
    for (index, item) in remote.iter().enumerate() {
        outcome.record(upsert_one(store, item).await?);
        progress.item(step, index + 1, total)?;
    }
    Ok(outcome)
}

fn log_outcome<T: SyncEntity>(outcome: &ReconcileOutcome) {
    info!(
        kind = %T::KIND,
        fetched = outcome.fetched,
        inserted = outcome.inserted,
        updated = outcome.updated,
        unchanged = outcome.unchanged,
        deleted = outcome.deleted,
        "collection reconciled"
    );
}
