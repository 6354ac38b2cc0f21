//! Driven port for per-account credentials and cached account data.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::define_port_error;
use super::ledger_source::AuthToken;

/// Cache key holding the commerce customer id resolved for an account.
pub const CUSTOMER_ID_KEY: &str = "customer_id";
/// Cache key holding whether the account's customer administers the shop.
pub const CUSTOMER_ADMIN_KEY: &str = "customer_admin";
/// Account type assigned to every identity handled by the engine.
pub const ACCOUNT_TYPE: &str = "member";

/// Local principal whose data is synchronised.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account {
    /// Login name.
    pub name: String,
    /// Account type, [`ACCOUNT_TYPE`] unless imported from elsewhere.
    pub account_type: String,
}

impl Account {
    /// Build an account of the default [`ACCOUNT_TYPE`].
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            account_type: ACCOUNT_TYPE.to_owned(),
        }
    }
}

define_port_error! {
    /// Errors raised by the credential store.
    pub enum CredentialStoreError {
        /// Account is not registered in the store.
        UnknownAccount { name: String } =>
            "unknown account {name}",
        /// Backing storage could not be read or written.
        Storage { message: String } =>
            "credential storage failed: {message}",
    }
}

/// Credential and cached-value access keyed by account.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// List every registered account.
    async fn accounts(&self) -> Result<Vec<Account>, CredentialStoreError>;

    /// Return the account secret (national id), if one is stored.
    async fn secret(&self, account: &Account) -> Result<Option<String>, CredentialStoreError>;

    /// Return the cached session token, if the account has logged in.
    async fn auth_token(
        &self,
        account: &Account,
    ) -> Result<Option<AuthToken>, CredentialStoreError>;

    /// Forget the account secret so the user must authenticate again.
    async fn clear_secret(&self, account: &Account) -> Result<(), CredentialStoreError>;

    /// Read a cached value.
    async fn cached_value(
        &self,
        account: &Account,
        key: &str,
    ) -> Result<Option<String>, CredentialStoreError>;

    /// Write a cached value.
    async fn set_cached_value(
        &self,
        account: &Account,
        key: &str,
        value: &str,
    ) -> Result<(), CredentialStoreError>;
}
