//! Scripted ports and fixtures shared by unit, integration, and behaviour
//! tests.
//!
//! Compiled for `cfg(test)` and behind the `test-support` feature.

mod harness;
mod sinks;
mod sources;

pub use harness::{FixedClock, SyncHarness, customer, event, fixed_time, order, payment};
pub use sinks::{RecordingNotifier, RecordingSleeper, RecordingTelemetry, StaticNetworkMonitor};
pub use sources::{ScriptedCommerceSource, ScriptedDirectorySource, ScriptedLedgerSource};

use std::sync::{Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
