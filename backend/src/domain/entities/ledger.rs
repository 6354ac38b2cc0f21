//! Personal ledger pages and their transactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityKind, SyncEntity};

/// Money moving into or out of a personal ledger.
///
/// Exactly one direction is set per transaction; the enum keeps the other
/// one unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionAmount {
    /// Amount credited to the account.
    In(f64),
    /// Amount charged to the account.
    Out(f64),
}

/// One ledger line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Credited or charged amount.
    pub amount: TransactionAmount,
    /// Free-form description shown on the ledger page.
    pub description: String,
    /// Booking time, when the page provides one.
    pub timestamp: Option<DateTime<Utc>>,
    /// Whether the user has already been told about this line.
    ///
    /// Moves from `false` to `true` once and never reverts.
    pub notified: bool,
}

impl Transaction {
    /// Build an un-notified credit.
    pub fn incoming(amount: f64, description: impl Into<String>) -> Self {
        Self::with_amount(TransactionAmount::In(amount), description)
    }

    /// Build an un-notified charge.
    pub fn outgoing(amount: f64, description: impl Into<String>) -> Self {
        Self::with_amount(TransactionAmount::Out(amount), description)
    }

    fn with_amount(amount: TransactionAmount, description: impl Into<String>) -> Self {
        Self {
            amount,
            description: description.into(),
            timestamp: None,
            notified: false,
        }
    }

    /// Attach a booking time.
    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Return the credited amount, if this line is a credit.
    pub fn amount_in(&self) -> Option<f64> {
        match self.amount {
            TransactionAmount::In(value) => Some(value),
            TransactionAmount::Out(_) => None,
        }
    }

    /// Return the charged amount, if this line is a charge.
    pub fn amount_out(&self) -> Option<f64> {
        match self.amount {
            TransactionAmount::Out(value) => Some(value),
            TransactionAmount::In(_) => None,
        }
    }

    /// Whether both values describe the same ledger line, ignoring `notified`.
    pub fn is_same_entry(&self, other: &Self) -> bool {
        self.amount == other.amount
            && self.description == other.description
            && self.timestamp == other.timestamp
    }

    /// Return this line flagged as notified.
    #[must_use]
    pub fn mark_notified(mut self) -> Self {
        self.notified = true;
        self
    }
}

/// Ledger page of one identity, keyed by account name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalLedger {
    /// Name of the account (or synthetic account) owning the ledger.
    pub account_name: String,
    /// Account type the ledger was fetched for.
    pub account_type: String,
    /// Balance printed on the page, if any.
    pub balance: Option<f64>,
    /// Ledger lines in page order.
    pub transactions: Vec<Transaction>,
}

impl PersonalLedger {
    /// Build a ledger with no balance information.
    pub fn new(
        account_name: impl Into<String>,
        account_type: impl Into<String>,
        transactions: Vec<Transaction>,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            account_type: account_type.into(),
            balance: None,
            transactions,
        }
    }

    /// Copy `notified` flags from a previously stored copy of this ledger.
    ///
    /// Freshly parsed pages always report `notified = false`; each stored
    /// notified line marks at most one matching fresh line.
    ///
    /// # Examples
    /// ```
    /// use membership_sync::domain::entities::{PersonalLedger, Transaction};
    ///
    /// let stored = PersonalLedger::new(
    ///     "ana",
    ///     "member",
    ///     vec![Transaction::incoming(10.0, "quota").mark_notified()],
    /// );
    /// let fresh = PersonalLedger::new(
    ///     "ana",
    ///     "member",
    ///     vec![
    ///         Transaction::incoming(10.0, "quota"),
    ///         Transaction::outgoing(4.5, "dinner"),
    ///     ],
    /// );
    /// let merged = fresh.carry_notified_from(&stored);
    /// assert!(merged.transactions[0].notified);
    /// assert!(!merged.transactions[1].notified);
    /// ```
    #[must_use]
    pub fn carry_notified_from(mut self, stored: &Self) -> Self {
        let mut consumed = vec![false; stored.transactions.len()];
        for transaction in &mut self.transactions {
            let matched = stored
                .transactions
                .iter()
                .zip(consumed.iter_mut())
                .find(|(previous, used)| {
                    !**used && previous.notified && previous.is_same_entry(transaction)
                });
            if let Some((_, used)) = matched {
                *used = true;
                transaction.notified = true;
            }
        }
        self
    }
}

impl SyncEntity for PersonalLedger {
    type Id = String;

    const KIND: EntityKind = EntityKind::Ledgers;

    fn id(&self) -> &Self::Id {
        &self.account_name
    }
}
