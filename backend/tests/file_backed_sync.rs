//! Runs against file-backed credentials and a persisted store snapshot.

use std::sync::Arc;

use membership_sync::domain::entities::{Member, Transaction};
use membership_sync::domain::ports::{CUSTOMER_ID_KEY, CredentialStore};
use membership_sync::domain::{
    ProgressReporter, RemoteSources, SyncEnvelope, SyncOrchestrator, SyncPorts, SyncRunConfig,
};
use membership_sync::outbound::credentials::JsonCredentialStore;
use membership_sync::outbound::memory::{MemoryStores, SnapshotFile};
use membership_sync::test_support::{
    FixedClock, RecordingNotifier, RecordingTelemetry, ScriptedCommerceSource,
    ScriptedDirectorySource, ScriptedLedgerSource, customer, event, fixed_time, order, payment,
};
use rstest::{fixture, rstest};
use tempfile::TempDir;

struct Remote {
    ledger: Arc<ScriptedLedgerSource>,
    directory: Arc<ScriptedDirectorySource>,
    commerce: Arc<ScriptedCommerceSource>,
}

#[fixture]
fn remote() -> Remote {
    Remote {
        ledger: Arc::new(
            ScriptedLedgerSource::default()
                .with_page("tok-ana", vec![Transaction::incoming(10.0, "quota")]),
        ),
        directory: Arc::new(ScriptedDirectorySource::new(vec![
            Member::new(1, "Ana").with_national_id("12345678A"),
        ])),
        commerce: Arc::new(
            ScriptedCommerceSource::default()
                .with_customers(vec![customer(42, "12345678A", "customer")])
                .with_orders(vec![order(1, 42), order(2, 43)])
                .with_events(vec![event(5, "Spring Walk")])
                .with_payments(vec![payment("bacs"), payment("cod")]),
        ),
    }
}

#[fixture]
fn workspace() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("credentials.json"),
        serde_json::json!({
            "accounts": [{
                "account": { "name": "Ana", "account_type": "member" },
                "secret": "12345678A",
                "auth_token": "tok-ana"
            }]
        })
        .to_string(),
    )
    .expect("seed credentials");
    dir
}

async fn run_once(dir: &TempDir, remote: &Remote) -> MemoryStores {
    let snapshot = SnapshotFile::new(dir.path().join("snapshot.json"));
    let stores = MemoryStores::from_snapshot(snapshot.load().expect("load snapshot"));
    let credentials =
        JsonCredentialStore::open(dir.path().join("credentials.json")).expect("open credentials");
    let notifier = Arc::new(RecordingNotifier::default());
    let ports = SyncPorts::new(
        stores.local_stores(),
        RemoteSources {
            ledger: remote.ledger.clone(),
            directory: remote.directory.clone(),
            commerce: remote.commerce.clone(),
        },
        Arc::new(credentials),
        notifier.clone(),
    );
    let envelope = SyncEnvelope::new(
        SyncOrchestrator::new(ports, Arc::new(FixedClock(fixed_time()))),
        Arc::new(RecordingTelemetry::default()),
        notifier,
    );

    let outcome = envelope
        .run(&SyncRunConfig::default(), &ProgressReporter::detached())
        .await;
    assert!(outcome.is_success(), "run failed: {outcome:?}");

    snapshot
        .save(&stores.snapshot().await)
        .expect("save snapshot");
    stores
}

#[rstest]
#[tokio::test]
async fn snapshot_and_credentials_survive_restarts(workspace: TempDir, remote: Remote) {
    let first = run_once(&workspace, &remote).await;
    let after_first = first.snapshot().await;

    let second = run_once(&workspace, &remote).await;
    let after_second = second.snapshot().await;

    assert_eq!(after_first, after_second);
    assert_eq!(after_second.members.len(), 1);
    assert_eq!(after_second.customers.len(), 1);
    assert_eq!(after_second.payments.len(), 2);
    assert_eq!(after_second.events.len(), 1);
    assert_eq!(
        after_second
            .orders
            .iter()
            .map(|order| order.id)
            .collect::<Vec<_>>(),
        vec![1]
    );
    assert!(after_second.ledgers[0].transactions[0].notified);

    let reopened = JsonCredentialStore::open(workspace.path().join("credentials.json"))
        .expect("reopen credentials");
    let account = reopened.accounts().await.expect("accounts").remove(0);
    assert_eq!(
        reopened
            .cached_value(&account, CUSTOMER_ID_KEY)
            .await
            .expect("cached value"),
        Some("42".to_owned())
    );
}

#[rstest]
#[tokio::test]
async fn remote_removals_are_pruned_after_restart(workspace: TempDir, remote: Remote) {
    run_once(&workspace, &remote).await;
    remote.commerce.set_payments(vec![payment("bacs")]);

    let stores = run_once(&workspace, &remote).await;

    let payments = stores.snapshot().await.payments;
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].id, "bacs");
}
