//! Value types for every synchronised collection.
//!
//! Each collection exposes a stable identifier through [`SyncEntity`] so the
//! reconciler can diff a remote snapshot against local state without knowing
//! which kind it is handling.

use std::fmt;

use serde::Serialize;

mod commerce;
mod ledger;
mod member;

pub use commerce::{
    Customer, Event, Order, OrderItem, PaymentMethod, ROLE_ADMINISTRATOR, StockStatus,
};
pub use ledger::{PersonalLedger, Transaction, TransactionAmount};
pub use member::Member;

/// Collections handled by the synchronisation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Membership directory records.
    Members,
    /// Personal ledgers keyed by account name.
    Ledgers,
    /// Commerce customers.
    Customers,
    /// Commerce orders.
    Orders,
    /// Commerce events (bookable products).
    Events,
    /// Commerce payment methods.
    Payments,
}

impl EntityKind {
    /// Stable lowercase name used in logs and span fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Members => "members",
            Self::Ledgers => "ledgers",
            Self::Customers => "customers",
            Self::Orders => "orders",
            Self::Events => "events",
            Self::Payments => "payments",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record with a stable identifier assigned by its remote source.
///
/// Local storage holds at most one record per [`SyncEntity::id`] for each
/// [`SyncEntity::KIND`].
///
/// # Examples
/// ```
/// use membership_sync::domain::entities::{EntityKind, Member, SyncEntity};
///
/// let member = Member::new(7, "Ana");
/// assert_eq!(*member.id(), 7);
/// assert_eq!(Member::KIND, EntityKind::Members);
/// ```
pub trait SyncEntity: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Identifier type, unique within one collection.
    type Id: Clone + Ord + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// Collection this entity belongs to.
    const KIND: EntityKind;

    /// Stable identifier of this record.
    fn id(&self) -> &Self::Id;
}
