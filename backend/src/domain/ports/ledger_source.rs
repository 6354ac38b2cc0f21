//! Driven port for the personal ledger website.
//!
//! Logging in yields an opaque token; the page fetched with it is parsed into
//! a [`PersonalLedger`] for the account it belongs to.

use std::fmt;

use async_trait::async_trait;

use super::define_port_error;
use super::credential_store::Account;
use crate::domain::entities::PersonalLedger;

/// Opaque session token returned by the ledger website.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wrap a raw token value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw token value for transport headers.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

/// Raw ledger page as served by the website.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerPage {
    /// Response body.
    pub body: String,
}

impl LedgerPage {
    /// Wrap a response body.
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

define_port_error! {
    /// Errors surfaced while talking to the ledger website.
    pub enum LedgerSourceError {
        /// Network transport failed before receiving a response.
        Transport { message: String } =>
            "ledger transport failed: {message}",
        /// Credentials or token were rejected.
        Unauthorized { message: String } =>
            "ledger login rejected: {message}",
        /// The page could not be parsed into a ledger.
        Parse { message: String } =>
            "ledger page could not be parsed: {message}",
    }
}

/// Port for authenticating against and reading the ledger website.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// Log in as `name` using `secret` and return a session token.
    async fn login(&self, name: &str, secret: &str) -> Result<AuthToken, LedgerSourceError>;

    /// Fetch the ledger page visible to `token`.
    async fn fetch_page(&self, token: &AuthToken) -> Result<LedgerPage, LedgerSourceError>;

    /// Parse `page` into the ledger of `account`.
    fn parse(
        &self,
        page: &LedgerPage,
        account: &Account,
    ) -> Result<PersonalLedger, LedgerSourceError>;
}
