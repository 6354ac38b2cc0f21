//! Scripted remote sources.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::lock;
use crate::domain::entities::{
    Customer, Event, Member, Order, PaymentMethod, PersonalLedger, Transaction,
};
use crate::domain::ports::{
    Account, AuthToken, CommerceSource, CommerceSourceError, DirectorySource,
    DirectorySourceError, FetchProgress, LedgerPage, LedgerSource, LedgerSourceError,
};

/// Ledger site whose pages are keyed by session token.
///
/// `fetch_page` echoes the token as the page body and `parse` looks the
/// body up in the scripted pages.
#[derive(Default)]
pub struct ScriptedLedgerSource {
    logins: Mutex<BTreeMap<String, Result<AuthToken, LedgerSourceError>>>,
    pages: Mutex<BTreeMap<String, Result<Vec<Transaction>, LedgerSourceError>>>,
    login_attempts: Mutex<Vec<(String, String)>>,
    fetches: AtomicUsize,
}

impl ScriptedLedgerSource {
    /// Serve `transactions` to whoever holds `token`.
    pub fn with_page(self, token: &str, transactions: Vec<Transaction>) -> Self {
        lock(&self.pages).insert(token.to_owned(), Ok(transactions));
        self
    }

    /// Fail fetching the page of `token`.
    pub fn with_failing_page(self, token: &str, error: LedgerSourceError) -> Self {
        lock(&self.pages).insert(token.to_owned(), Err(error));
        self
    }

    /// Let `name` log in and receive `token`.
    pub fn with_login(self, name: &str, token: &str) -> Self {
        lock(&self.logins).insert(name.to_owned(), Ok(AuthToken::new(token)));
        self
    }

    /// Reject logins of `name`.
    pub fn with_failing_login(self, name: &str, error: LedgerSourceError) -> Self {
        lock(&self.logins).insert(name.to_owned(), Err(error));
        self
    }

    /// Replace the page served for `token`.
    pub fn set_page(&self, token: &str, transactions: Vec<Transaction>) {
        lock(&self.pages).insert(token.to_owned(), Ok(transactions));
    }

    /// `(name, secret)` pairs passed to `login`, in call order.
    pub fn login_attempts(&self) -> Vec<(String, String)> {
        lock(&self.login_attempts).clone()
    }

    /// Number of page fetches.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerSource for ScriptedLedgerSource {
    async fn login(&self, name: &str, secret: &str) -> Result<AuthToken, LedgerSourceError> {
        lock(&self.login_attempts).push((name.to_owned(), secret.to_owned()));
        lock(&self.logins)
            .get(name)
            .cloned()
            .unwrap_or_else(|| Err(LedgerSourceError::unauthorized(format!("unknown user {name}"))))
    }

    async fn fetch_page(&self, token: &AuthToken) -> Result<LedgerPage, LedgerSourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match lock(&self.pages).get(token.as_str()) {
            Some(Ok(_)) => Ok(LedgerPage::new(token.as_str())),
            Some(Err(error)) => Err(error.clone()),
            None => Err(LedgerSourceError::unauthorized("token not recognised")),
        }
    }

    fn parse(
        &self,
        page: &LedgerPage,
        account: &Account,
    ) -> Result<PersonalLedger, LedgerSourceError> {
        let pages = lock(&self.pages);
        let transactions = match pages.get(&page.body) {
            Some(Ok(transactions)) => transactions.clone(),
            Some(Err(error)) => return Err(error.clone()),
            None => return Err(LedgerSourceError::parse("unknown page")),
        };
        Ok(PersonalLedger::new(
            account.name.clone(),
            account.account_type.clone(),
            transactions,
        ))
    }
}

/// Directory returning a fixed member list or a fixed error.
pub struct ScriptedDirectorySource {
    response: Mutex<Result<Vec<Member>, DirectorySourceError>>,
    calls: AtomicUsize,
}

impl ScriptedDirectorySource {
    /// Directory listing `members`.
    pub fn new(members: Vec<Member>) -> Self {
        Self {
            response: Mutex::new(Ok(members)),
            calls: AtomicUsize::new(0),
        }
    }

    /// Directory failing with `error`.
    pub fn failing(error: DirectorySourceError) -> Self {
        Self {
            response: Mutex::new(Err(error)),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of fetches.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedDirectorySource {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl DirectorySource for ScriptedDirectorySource {
    async fn fetch_members(&self) -> Result<Vec<Member>, DirectorySourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.response).clone()
    }
}

/// Shop returning scripted collections and recording order filters.
#[derive(Default)]
pub struct ScriptedCommerceSource {
    customers: Mutex<Vec<Customer>>,
    payments: Mutex<Vec<PaymentMethod>>,
    orders: Mutex<Vec<Order>>,
    events: Mutex<Vec<Event>>,
    failing_customers: Mutex<Option<CommerceSourceError>>,
    order_filters: Mutex<Vec<Option<i64>>>,
}

impl ScriptedCommerceSource {
    /// Serve `customers`.
    pub fn with_customers(self, customers: Vec<Customer>) -> Self {
        *lock(&self.customers) = customers;
        self
    }

    /// Serve `payments`.
    pub fn with_payments(self, payments: Vec<PaymentMethod>) -> Self {
        *lock(&self.payments) = payments;
        self
    }

    /// Serve `orders`, filtered by customer when requested.
    pub fn with_orders(self, orders: Vec<Order>) -> Self {
        *lock(&self.orders) = orders;
        self
    }

    /// Serve `events`.
    pub fn with_events(self, events: Vec<Event>) -> Self {
        *lock(&self.events) = events;
        self
    }

    /// Fail customer listing with `error`.
    pub fn with_failing_customers(self, error: CommerceSourceError) -> Self {
        *lock(&self.failing_customers) = Some(error);
        self
    }

    /// Replace the payment methods served.
    pub fn set_payments(&self, payments: Vec<PaymentMethod>) {
        *lock(&self.payments) = payments;
    }

    /// Filters passed to `fetch_orders`, in call order.
    pub fn order_filters(&self) -> Vec<Option<i64>> {
        lock(&self.order_filters).clone()
    }
}

#[async_trait]
impl CommerceSource for ScriptedCommerceSource {
    async fn fetch_customers(&self) -> Result<Vec<Customer>, CommerceSourceError> {
        if let Some(error) = lock(&self.failing_customers).clone() {
            return Err(error);
        }
        Ok(lock(&self.customers).clone())
    }

    async fn fetch_payments(&self) -> Result<Vec<PaymentMethod>, CommerceSourceError> {
        Ok(lock(&self.payments).clone())
    }

    async fn fetch_orders(
        &self,
        customer_id: Option<i64>,
    ) -> Result<Vec<Order>, CommerceSourceError> {
        lock(&self.order_filters).push(customer_id);
        Ok(lock(&self.orders)
            .iter()
            .filter(|order| customer_id.is_none_or(|id| order.customer_id == id))
            .cloned()
            .collect())
    }

    async fn fetch_events(
        &self,
        on_progress: FetchProgress<'_>,
    ) -> Result<Vec<Event>, CommerceSourceError> {
        let events = lock(&self.events).clone();
        on_progress(1, 1);
        Ok(events)
    }
}
