//! Scenario-world methods for synchronisation run BDD tests.

use std::sync::Arc;

use membership_sync::domain::ProgressReporter;
use membership_sync::domain::ports::{ACCOUNT_TYPE, DirectorySourceError};
use membership_sync::outbound::memory::{LocalSnapshot, MemoryStores};
use membership_sync::test_support::{
    RecordingNotifier, ScriptedDirectorySource, ScriptedLedgerSource, SyncHarness,
};
use tokio::runtime::Runtime;

use crate::{
    PersonalLedger, RuntimeHandle, ScenarioSetup, SyncRunWorld, scenario_run_config,
};

impl SyncRunWorld {
    /// Apply `change` to the scenario description.
    pub fn describe(&self, change: impl FnOnce(&mut ScenarioSetup)) {
        let mut setup = self.setup.get().unwrap_or_default();
        change(&mut setup);
        self.setup.set(setup);
    }

    /// Seed the local store with an empty ledger for `account`.
    pub fn store_empty_ledger(&self, account: &str) {
        self.describe(|setup| {
            setup
                .stored_ledgers
                .push(PersonalLedger::new(account, ACCOUNT_TYPE, Vec::new()));
        });
    }

    fn harness(&self) -> Arc<SyncHarness> {
        if let Some(harness) = self.harness.get() {
            return harness;
        }
        let setup = self.setup.get().unwrap_or_default();

        let ledger = setup
            .logins
            .iter()
            .fold(ScriptedLedgerSource::default(), |source, (name, token)| {
                source.with_login(name, token)
            });
        let ledger = setup
            .pages
            .into_iter()
            .fold(ledger, |source, (token, transactions)| {
                source.with_page(&token, transactions)
            });
        let directory = if setup.directory_down {
            ScriptedDirectorySource::failing(DirectorySourceError::transport("connection refused"))
        } else {
            ScriptedDirectorySource::new(setup.members)
        };

        let mut harness = SyncHarness::new(setup.accounts)
            .with_ledger(ledger)
            .with_directory(directory)
            .with_notifier(RecordingNotifier::new(!setup.notifications_denied));
        harness.stores = MemoryStores::from_snapshot(LocalSnapshot {
            ledgers: setup.stored_ledgers,
            ..LocalSnapshot::default()
        });

        let harness = Arc::new(harness);
        self.harness.set(harness.clone());
        harness
    }

    fn runtime(&self) -> RuntimeHandle {
        if let Some(runtime) = self.runtime.get() {
            return runtime;
        }
        let runtime = RuntimeHandle(Arc::new(Runtime::new().expect("create runtime")));
        self.runtime.set(runtime.clone());
        runtime
    }

    /// Execute one run through the failure envelope.
    pub fn run_sync(&self) {
        let harness = self.harness();
        let runtime = self.runtime();
        let outcome = runtime.0.block_on(async {
            let progress = ProgressReporter::detached();
            harness
                .envelope()
                .run(&scenario_run_config(), &progress)
                .await
        });
        self.last_outcome.set(outcome);
    }

    /// Drive `future` to completion on the scenario runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime().0.block_on(future)
    }

    /// Harness built by the first run.
    pub fn built_harness(&self) -> Arc<SyncHarness> {
        self.harness.get().expect("harness should be built by a run")
    }
}
