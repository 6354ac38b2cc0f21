//! End-to-end runs of the orchestrator over in-memory stores and scripted
//! sources.

use std::sync::Arc;

use mockable::MockClock;
use mockall_011::Sequence;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::entities::{Member, PersonalLedger, Transaction};
use crate::domain::ports::{
    ACCOUNT_TYPE, CUSTOMER_ADMIN_KEY, CUSTOMER_ID_KEY, CommerceSourceError, DirectorySourceError,
    LedgerSourceError,
};
use crate::domain::sync_outcome::{
    AccountSkipReason, AssociatedOutcome, AssociatedSkipReason, LedgerOutcome,
};
use crate::outbound::credentials::CredentialRecord;
use crate::outbound::memory::{LocalSnapshot, MemoryStores};
use crate::test_support::{
    RecordingNotifier, ScriptedCommerceSource, ScriptedDirectorySource, ScriptedLedgerSource,
    SyncHarness, customer, order, payment,
};

fn account(name: &str, secret: &str, token: &str) -> CredentialRecord {
    CredentialRecord::new(name)
        .with_secret(secret)
        .with_auth_token(token)
}

fn ledger_only() -> SyncRunConfig {
    SyncRunConfig {
        transactions: true,
        socios: false,
        customers: false,
        orders: false,
        events: false,
        payments: false,
    }
}

fn seeded_ledger(name: &str, transactions: Vec<Transaction>) -> MemoryStores {
    MemoryStores::from_snapshot(LocalSnapshot {
        ledgers: vec![PersonalLedger::new(name, ACCOUNT_TYPE, transactions)],
        ..LocalSnapshot::default()
    })
}

#[fixture]
fn progress() -> ProgressReporter {
    ProgressReporter::detached()
}

fn ledger_of(summary: &RunSummary, index: usize) -> Option<LedgerOutcome> {
    match &summary.accounts.get(index)?.outcome {
        AccountOutcome::Synced(stages) => stages.ledger,
        AccountOutcome::Skipped { .. } | AccountOutcome::Failed { .. } => None,
    }
}

#[rstest]
#[tokio::test]
async fn first_run_stores_transactions_without_notifying(progress: ProgressReporter) {
    let harness = SyncHarness::new(vec![account("Ana", "12345678A", "tok-ana")]).with_ledger(
        ScriptedLedgerSource::default().with_page("tok-ana", vec![Transaction::incoming(10.0, "quota")]),
    );

    let summary = harness
        .orchestrator()
        .run(&ledger_only(), &progress)
        .await
        .expect("run succeeds");

    assert!(summary.first_run);
    let stored = harness.stores.ledgers.records().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].transactions.len(), 1);
    assert_eq!(stored[0].transactions[0].amount_in(), Some(10.0));
    assert!(stored[0].transactions[0].notified);
    assert!(harness.notifier.transactions().is_empty());
    assert_eq!(
        ledger_of(&summary, 0),
        Some(LedgerOutcome {
            transactions: 1,
            newly_notified: 1,
            notifications_sent: 0,
        })
    );
}

#[rstest]
#[tokio::test]
async fn new_lines_are_notified_exactly_once(progress: ProgressReporter) {
    let page = vec![
        Transaction::incoming(10.0, "quota"),
        Transaction::outgoing(4.5, "dinner"),
    ];
    let mut harness = SyncHarness::new(vec![account("Ana", "12345678A", "tok-ana")])
        .with_ledger(ScriptedLedgerSource::default().with_page("tok-ana", page));
    harness.stores = seeded_ledger(
        "Ana",
        vec![Transaction::incoming(10.0, "quota").mark_notified()],
    );
    let orchestrator = harness.orchestrator();

    let first = orchestrator
        .run(&ledger_only(), &progress)
        .await
        .expect("first run succeeds");
    let second = orchestrator
        .run(&ledger_only(), &progress)
        .await
        .expect("second run succeeds");

    assert!(!first.first_run);
    let delivered = harness.notifier.transactions();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].0, "Ana");
    assert_eq!(delivered[0].1.description, "dinner");
    assert_eq!(ledger_of(&second, 0).map(|l| l.newly_notified), Some(0));
    let stored = harness.stores.ledgers.records().await;
    assert!(stored[0].transactions.iter().all(|t| t.notified));
}

#[rstest]
#[tokio::test]
async fn lines_are_marked_notified_without_permission(progress: ProgressReporter) {
    let mut harness = SyncHarness::new(vec![account("Ana", "12345678A", "tok-ana")])
        .with_ledger(
            ScriptedLedgerSource::default()
                .with_page("tok-ana", vec![Transaction::outgoing(2.0, "coffee")]),
        )
        .with_notifier(RecordingNotifier::new(false));
    harness.stores = seeded_ledger("Someone", Vec::new());

    let summary = harness
        .orchestrator()
        .run(&ledger_only(), &progress)
        .await
        .expect("run succeeds");

    assert!(harness.notifier.transactions().is_empty());
    assert_eq!(ledger_of(&summary, 0).map(|l| l.newly_notified), Some(1));
    let ana = harness
        .stores
        .ledgers
        .records()
        .await
        .into_iter()
        .find(|ledger| ledger.account_name == "Ana")
        .expect("ana ledger stored");
    assert!(ana.transactions[0].notified);
}

#[rstest]
#[tokio::test]
async fn account_without_token_is_skipped_and_secret_cleared(progress: ProgressReporter) {
    let harness = SyncHarness::new(vec![CredentialRecord::new("Ana").with_secret("12345678A")]);

    let summary = harness
        .orchestrator()
        .run(&SyncRunConfig::default(), &progress)
        .await
        .expect("run succeeds");

    assert_eq!(
        summary.accounts[0].outcome,
        AccountOutcome::Skipped {
            reason: AccountSkipReason::MissingAuthToken,
        }
    );
    assert_eq!(harness.credentials.records().await[0].secret, None);
    assert_eq!(harness.ledger.fetch_count(), 0);
}

#[rstest]
#[tokio::test]
async fn failing_account_does_not_stop_the_next(progress: ProgressReporter) {
    let harness = SyncHarness::new(vec![
        account("Ana", "12345678A", "tok-ana"),
        account("Berta", "87654321B", "tok-berta"),
    ])
    .with_ledger(
        ScriptedLedgerSource::default()
            .with_failing_page("tok-ana", LedgerSourceError::transport("connection reset"))
            .with_page("tok-berta", vec![Transaction::incoming(5.0, "refund")]),
    );

    let summary = harness
        .orchestrator()
        .run(&ledger_only(), &progress)
        .await
        .expect("run succeeds");

    assert!(matches!(
        &summary.accounts[0].outcome,
        AccountOutcome::Failed { error } if error.contains("connection reset")
    ));
    assert!(matches!(summary.accounts[1].outcome, AccountOutcome::Synced(_)));
    let stored = harness.stores.ledgers.records().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].account_name, "Berta");
}

#[rstest]
#[case("customer", Some(42), vec![1])]
#[case("administrator", None, vec![1, 2])]
#[tokio::test]
async fn orders_are_filtered_for_non_administrators(
    progress: ProgressReporter,
    #[case] role: &str,
    #[case] expected_filter: Option<i64>,
    #[case] expected_orders: Vec<i64>,
) {
    let harness = SyncHarness::new(vec![account("Ana", "12345678a", "tok-ana")])
        .with_ledger(ScriptedLedgerSource::default().with_page("tok-ana", Vec::new()))
        .with_commerce(
            ScriptedCommerceSource::default()
                .with_customers(vec![
                    customer(42, "12345678A", role),
                    customer(7, "someone-else", "customer"),
                ])
                .with_orders(vec![order(1, 42), order(2, 7)])
                .with_payments(vec![payment("bacs")]),
        );

    let summary = harness
        .orchestrator()
        .run(&SyncRunConfig::default(), &progress)
        .await
        .expect("run succeeds");

    assert!(matches!(summary.accounts[0].outcome, AccountOutcome::Synced(_)));
    assert_eq!(harness.commerce.order_filters(), vec![expected_filter]);
    let mut stored: Vec<i64> = harness
        .stores
        .orders
        .records()
        .await
        .iter()
        .map(|o| o.id)
        .collect();
    stored.sort_unstable();
    assert_eq!(stored, expected_orders);

    let record = harness.credentials.records().await.remove(0);
    assert_eq!(record.cached.get(CUSTOMER_ID_KEY).map(String::as_str), Some("42"));
    assert_eq!(
        record.cached.get(CUSTOMER_ADMIN_KEY).map(String::as_str),
        Some(if role == "administrator" { "true" } else { "false" })
    );
    assert_eq!(harness.stores.customers.len().await, 2);
    assert_eq!(harness.stores.payments.len().await, 1);
}

#[rstest]
#[tokio::test]
async fn cached_customer_id_is_not_overwritten(progress: ProgressReporter) {
    let harness = SyncHarness::new(vec![
        account("Ana", "12345678A", "tok-ana").with_cached(CUSTOMER_ID_KEY, "99"),
    ])
    .with_ledger(ScriptedLedgerSource::default().with_page("tok-ana", Vec::new()))
    .with_commerce(
        ScriptedCommerceSource::default()
            .with_customers(vec![customer(42, "12345678A", "customer")]),
    );

    harness
        .orchestrator()
        .run(&SyncRunConfig::default(), &progress)
        .await
        .expect("run succeeds");

    assert_eq!(harness.commerce.order_filters(), vec![Some(99)]);
}

#[rstest]
#[tokio::test]
async fn orders_wait_for_a_resolved_customer_id(progress: ProgressReporter) {
    let harness = SyncHarness::new(vec![account("Ana", "12345678A", "tok-ana")])
        .with_ledger(ScriptedLedgerSource::default().with_page("tok-ana", Vec::new()))
        .with_commerce(
            ScriptedCommerceSource::default()
                .with_customers(vec![customer(42, "12345678A", "customer")])
                .with_orders(vec![order(1, 42)]),
        );
    let config = SyncRunConfig::from_flags([("sync_customers", false)]);

    let summary = harness
        .orchestrator()
        .run(&config, &progress)
        .await
        .expect("run succeeds");

    let AccountOutcome::Synced(stages) = &summary.accounts[0].outcome else {
        panic!("account should sync");
    };
    assert_eq!(stages.orders, None);
    assert!(harness.commerce.order_filters().is_empty());
    assert!(harness.stores.orders.is_empty().await);
}

#[rstest]
#[tokio::test]
async fn missing_customer_fails_only_that_account(progress: ProgressReporter) {
    let harness = SyncHarness::new(vec![account("Ana", "12345678A", "tok-ana")])
        .with_ledger(ScriptedLedgerSource::default().with_page("tok-ana", Vec::new()))
        .with_commerce(
            ScriptedCommerceSource::default()
                .with_customers(vec![customer(7, "someone-else", "customer")]),
        );

    let summary = harness
        .orchestrator()
        .run(&SyncRunConfig::default(), &progress)
        .await
        .expect("run succeeds");

    assert!(matches!(
        &summary.accounts[0].outcome,
        AccountOutcome::Failed { error } if error.contains("logged in customer")
    ));
    assert!(harness.commerce.order_filters().is_empty());
    assert!(harness.stores.customers.is_empty().await);
}

#[rstest]
#[tokio::test]
async fn commerce_failure_is_recorded_on_the_account(progress: ProgressReporter) {
    let harness = SyncHarness::new(vec![account("Ana", "12345678A", "tok-ana")])
        .with_ledger(ScriptedLedgerSource::default().with_page("tok-ana", Vec::new()))
        .with_commerce(
            ScriptedCommerceSource::default()
                .with_failing_customers(CommerceSourceError::status(500_u16, "internal error")),
        );

    let summary = harness
        .orchestrator()
        .run(&SyncRunConfig::default(), &progress)
        .await
        .expect("run succeeds");

    assert!(matches!(
        summary.accounts[0].outcome,
        AccountOutcome::Failed { .. }
    ));
    assert_eq!(harness.stores.ledgers.len().await, 1);
}

#[rstest]
#[tokio::test]
async fn directory_members_resolve_associated_ledgers(progress: ProgressReporter) {
    let harness = SyncHarness::new(vec![account("Ana", "12345678a", "tok-ana")])
        .with_directory(ScriptedDirectorySource::new(vec![
            Member::new(1, "Ana").with_national_id("12345678A"),
            Member::new(2, "Berta")
                .with_national_id("87654321B")
                .associated_with(1),
        ]))
        .with_ledger(
            ScriptedLedgerSource::default()
                .with_page("tok-ana", Vec::new())
                .with_login("Berta", "tok-berta")
                .with_page("tok-berta", vec![Transaction::outgoing(3.0, "coffee")]),
        );
    let config = SyncRunConfig {
        socios: true,
        ..ledger_only()
    };

    let summary = harness
        .orchestrator()
        .run(&config, &progress)
        .await
        .expect("run succeeds");

    assert_eq!(summary.directory.map(|d| d.inserted), Some(2));
    assert_eq!(summary.associated.len(), 1);
    assert_eq!(summary.associated[0].member_id, 2);
    assert_eq!(
        summary.associated[0].outcome,
        AssociatedOutcome::Synced { transactions: 1 }
    );
    assert_eq!(
        harness.ledger.login_attempts(),
        vec![("Berta".to_owned(), "87654321B".to_owned())]
    );
    assert!(
        harness
            .stores
            .ledgers
            .records()
            .await
            .iter()
            .any(|ledger| ledger.account_name == "Berta")
    );
}

#[rstest]
#[tokio::test]
async fn one_failing_associated_identity_does_not_stop_the_others(progress: ProgressReporter) {
    let harness = SyncHarness::new(vec![account("Ana", "12345678A", "tok-ana")])
        .with_directory(ScriptedDirectorySource::new(vec![
            Member::new(1, "Ana").with_national_id("12345678A"),
            Member::new(2, "Berta")
                .with_national_id("87654321B")
                .associated_with(1),
            Member::new(3, "Carla").associated_with(1),
            Member::new(4, "Dani")
                .with_national_id("11111111C")
                .associated_with(1),
        ]))
        .with_ledger(
            ScriptedLedgerSource::default()
                .with_page("tok-ana", Vec::new())
                .with_failing_login("Berta", LedgerSourceError::unauthorized("bad password"))
                .with_login("Dani", "tok-dani")
                .with_page("tok-dani", vec![Transaction::incoming(1.0, "gift")]),
        );
    let config = SyncRunConfig {
        socios: true,
        ..ledger_only()
    };

    let summary = harness
        .orchestrator()
        .run(&config, &progress)
        .await
        .expect("run succeeds");

    let outcomes: Vec<_> = summary
        .associated
        .iter()
        .map(|report| (report.member_id, report.outcome.clone()))
        .collect();
    assert!(matches!(outcomes[0], (2, AssociatedOutcome::Failed { .. })));
    assert_eq!(
        outcomes[1],
        (
            3,
            AssociatedOutcome::Skipped {
                reason: AssociatedSkipReason::MissingNationalId,
            }
        )
    );
    assert_eq!(outcomes[2], (4, AssociatedOutcome::Synced { transactions: 1 }));
}

#[rstest]
#[tokio::test]
async fn directory_failure_aborts_the_run(progress: ProgressReporter) {
    let harness = SyncHarness::new(Vec::new()).with_directory(ScriptedDirectorySource::failing(
        DirectorySourceError::decode("not json"),
    ));

    let error = harness
        .orchestrator()
        .run(&SyncRunConfig::default(), &progress)
        .await
        .expect_err("directory failure escapes");

    assert_eq!(error.class_name(), "DirectorySourceError");
}

#[rstest]
#[tokio::test]
async fn disabled_stages_are_not_touched(progress: ProgressReporter) {
    let harness = SyncHarness::new(vec![account("Ana", "12345678A", "tok-ana")])
        .with_ledger(ScriptedLedgerSource::default().with_page("tok-ana", Vec::new()));
    let config = SyncRunConfig::from_flags([
        ("sync_socios", false),
        ("sync_customers", false),
        ("sync_orders", false),
        ("sync_events", false),
        ("sync_payments", false),
    ]);

    let summary = harness
        .orchestrator()
        .run(&config, &progress)
        .await
        .expect("run succeeds");

    assert_eq!(summary.directory, None);
    assert_eq!(harness.directory.call_count(), 0);
    let AccountOutcome::Synced(stages) = &summary.accounts[0].outcome else {
        panic!("account should sync");
    };
    assert!(stages.ledger.is_some());
    assert_eq!(stages.customers, None);
    assert_eq!(stages.orders, None);
    assert!(harness.commerce.order_filters().is_empty());
}

#[rstest]
#[tokio::test]
async fn cancelled_run_stops_before_any_fetch(progress: ProgressReporter) {
    let harness = SyncHarness::new(vec![account("Ana", "12345678A", "tok-ana")])
        .with_ledger(ScriptedLedgerSource::default().with_page("tok-ana", Vec::new()));
    progress.cancellation().cancel();

    let error = harness
        .orchestrator()
        .run(&SyncRunConfig::default(), &progress)
        .await
        .expect_err("cancelled");

    assert!(error.is_cancelled());
    assert_eq!(harness.ledger.fetch_count(), 0);
    assert_eq!(harness.directory.call_count(), 0);
}

#[rstest]
#[tokio::test]
async fn run_ends_on_an_intermediate_step(progress: ProgressReporter) {
    let harness = SyncHarness::new(Vec::new());
    let observer = progress.subscribe();

    harness
        .orchestrator()
        .run(&SyncRunConfig::default(), &progress)
        .await
        .expect("run succeeds");

    assert_eq!(
        *observer.borrow(),
        crate::domain::progress::ProgressState::Running {
            step: ProgressStep::Intermediate,
            fraction: None,
        }
    );
}

#[rstest]
#[tokio::test]
async fn summary_is_stamped_by_the_injected_clock(progress: ProgressReporter) {
    let harness = SyncHarness::new(vec![account("Ana", "12345678A", "tok-ana")])
        .with_ledger(ScriptedLedgerSource::default().with_page("tok-ana", Vec::new()));
    let started = crate::test_support::fixed_time();
    let finished = started + chrono::Duration::minutes(3);
    let mut clock = MockClock::new();
    let mut sequence = Sequence::new();
    clock
        .expect_utc()
        .times(1)
        .in_sequence(&mut sequence)
        .return_const(started);
    clock
        .expect_utc()
        .times(1)
        .in_sequence(&mut sequence)
        .return_const(finished);

    let summary = SyncOrchestrator::new(harness.ports(), Arc::new(clock))
        .run(&ledger_only(), &progress)
        .await
        .expect("run succeeds");

    assert_eq!(summary.started_at, started);
    assert_eq!(summary.finished_at, finished);
}
