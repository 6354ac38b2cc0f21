//! Associated identity discovery and chaining.
//!
//! An account's secret doubles as the national id of its directory record;
//! members whose parent is that record are "associated" identities whose
//! ledgers are fetched by logging in as them.

mod chainer;
mod resolver;

pub use chainer::{AssociatedChainer, ChainError};
pub use resolver::{find_member_for_secret, normalise_secret, resolve_associated};
