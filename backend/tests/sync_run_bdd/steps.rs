//! Step definitions for synchronisation run BDD tests.

use super::*;
use membership_sync::domain::{
    AccountOutcome, AccountSkipReason, AssociatedOutcome, SyncOutcome,
};
use rstest_bdd_macros::{given, then, when};

// -----------------------------------------------------------------------------
// Given Steps
// -----------------------------------------------------------------------------

#[given("an account {name} with secret {secret} and session token {token}")]
fn an_account_with_secret_and_session_token(
    world: &SyncRunWorld,
    name: String,
    secret: String,
    token: String,
) {
    world.describe(|setup| {
        setup.accounts.push(
            CredentialRecord::new(name)
                .with_secret(secret)
                .with_auth_token(token),
        );
    });
}

#[given("an account {name} with secret {secret} but no session token")]
fn an_account_with_secret_but_no_session_token(world: &SyncRunWorld, name: String, secret: String) {
    world.describe(|setup| {
        setup
            .accounts
            .push(CredentialRecord::new(name).with_secret(secret));
    });
}

#[given("the ledger page for {token} lists a credit of {amount} for {description}")]
fn the_ledger_page_lists_a_credit(
    world: &SyncRunWorld,
    token: String,
    amount: f64,
    description: String,
) {
    world.describe(|setup| {
        setup
            .pages
            .push((token, vec![Transaction::incoming(amount, description)]));
    });
}

#[given("the ledger page for {token} is empty")]
fn the_ledger_page_is_empty(world: &SyncRunWorld, token: String) {
    world.describe(|setup| setup.pages.push((token, Vec::new())));
}

#[given("{name} can log in with session token {token}")]
fn can_log_in_with_session_token(world: &SyncRunWorld, name: String, token: String) {
    world.describe(|setup| setup.logins.push((name, token)));
}

#[given("the directory lists member {id} {name} with national id {national_id}")]
fn the_directory_lists_member(world: &SyncRunWorld, id: i64, name: String, national_id: String) {
    world.describe(|setup| {
        setup
            .members
            .push(Member::new(id, name).with_national_id(national_id));
    });
}

#[given(
    "the directory lists associated member {id} {name} with national id {national_id} under member {parent}"
)]
fn the_directory_lists_associated_member(
    world: &SyncRunWorld,
    id: i64,
    name: String,
    national_id: String,
    parent: i64,
) {
    world.describe(|setup| {
        setup.members.push(
            Member::new(id, name)
                .with_national_id(national_id)
                .associated_with(parent),
        );
    });
}

#[given("the local store already holds a ledger for {account}")]
fn the_local_store_already_holds_a_ledger(world: &SyncRunWorld, account: String) {
    world.store_empty_ledger(&account);
}

#[given("the directory is unavailable")]
fn the_directory_is_unavailable(world: &SyncRunWorld) {
    world.describe(|setup| setup.directory_down = true);
}

#[given("notifications are not permitted")]
fn notifications_are_not_permitted(world: &SyncRunWorld) {
    world.describe(|setup| setup.notifications_denied = true);
}

// -----------------------------------------------------------------------------
// When Steps
// -----------------------------------------------------------------------------

#[when("the synchronisation runs")]
fn the_synchronisation_runs(world: &SyncRunWorld) {
    world.run_sync();
}

#[when("the synchronisation runs again")]
fn the_synchronisation_runs_again(world: &SyncRunWorld) {
    world.run_sync();
}

// -----------------------------------------------------------------------------
// Then Steps
// -----------------------------------------------------------------------------

fn last_outcome(world: &SyncRunWorld) -> SyncOutcome {
    world.last_outcome.get().expect("a run should have finished")
}

#[then("the run succeeds")]
fn the_run_succeeds(world: &SyncRunWorld) {
    let outcome = last_outcome(world);
    assert!(outcome.is_success(), "expected success, got {outcome:?}");
}

#[then("the run fails with error class {error_class}")]
fn the_run_fails_with_error_class(world: &SyncRunWorld, error_class: String) {
    let outcome = last_outcome(world);
    let failure = outcome.failure().expect("run should fail");
    assert_eq!(failure.error_class, error_class);
}

#[then("the ledger of {account} holds {count} notified transactions")]
fn the_ledger_holds_notified_transactions(world: &SyncRunWorld, account: String, count: usize) {
    let harness = world.built_harness();
    let ledgers = world.block_on(harness.stores.ledgers.records());
    let ledger = ledgers
        .iter()
        .find(|ledger| ledger.account_name == account)
        .expect("ledger should be stored");
    assert_eq!(ledger.transactions.len(), count);
    assert!(ledger.transactions.iter().all(|t| t.notified));
}

#[then("{count} transaction notifications were delivered")]
fn transaction_notifications_were_delivered(world: &SyncRunWorld, count: usize) {
    assert_eq!(world.built_harness().notifier.transactions().len(), count);
}

#[then("member {id} is reported as synchronised with {count} transactions")]
fn member_is_reported_as_synchronised(world: &SyncRunWorld, id: i64, count: usize) {
    let outcome = last_outcome(world);
    let summary = outcome.summary().expect("run should succeed");
    let report = summary
        .associated
        .iter()
        .find(|report| report.member_id == id)
        .expect("associated member should be reported");
    assert_eq!(
        report.outcome,
        AssociatedOutcome::Synced {
            transactions: count
        }
    );
}

#[then("account {name} is skipped for a missing session token")]
fn account_is_skipped_for_missing_token(world: &SyncRunWorld, name: String) {
    let outcome = last_outcome(world);
    let summary = outcome.summary().expect("run should succeed");
    let report = summary
        .accounts
        .iter()
        .find(|report| report.account == name)
        .expect("account should be reported");
    assert_eq!(
        report.outcome,
        AccountOutcome::Skipped {
            reason: AccountSkipReason::MissingAuthToken,
        }
    );
}

#[then("the stored secret of {name} is cleared")]
fn the_stored_secret_is_cleared(world: &SyncRunWorld, name: String) {
    let harness = world.built_harness();
    let records = world.block_on(harness.credentials.records());
    let record = records
        .iter()
        .find(|record| record.account.name == name)
        .expect("record should exist");
    assert_eq!(record.secret, None);
}

#[then("the failure was captured by telemetry")]
fn the_failure_was_captured_by_telemetry(world: &SyncRunWorld) {
    assert_eq!(world.built_harness().telemetry.failures().len(), 1);
}

#[then("{count} error notifications were delivered")]
fn error_notifications_were_delivered(world: &SyncRunWorld, count: usize) {
    assert_eq!(world.built_harness().notifier.errors().len(), count);
}
