//! Scenario bindings for synchronisation run BDD tests.

use super::*;
use rstest_bdd_macros::scenario;

#[scenario(
    path = "tests/features/sync_run.feature",
    name = "First run stores ledger lines without notifying"
)]
fn first_run_stores_ledger_lines_without_notifying(world: SyncRunWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/sync_run.feature",
    name = "New ledger lines are notified exactly once"
)]
fn new_ledger_lines_are_notified_exactly_once(world: SyncRunWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/sync_run.feature",
    name = "Notices are withheld without permission"
)]
fn notices_are_withheld_without_permission(world: SyncRunWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/sync_run.feature",
    name = "Associated members are synchronised through their own login"
)]
fn associated_members_are_synchronised_through_their_own_login(world: SyncRunWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/sync_run.feature",
    name = "Accounts without a session token are skipped"
)]
fn accounts_without_a_session_token_are_skipped(world: SyncRunWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/sync_run.feature",
    name = "A directory outage fails the run"
)]
fn a_directory_outage_fails_the_run(world: SyncRunWorld) {
    drop(world);
}
