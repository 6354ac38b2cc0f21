//! JSON-file credential store.
//!
//! Holds one record per account: its secret, the session token cached by
//! the last interactive login, and free-form cached values. Mutations are
//! written back to the file immediately when the store is file-backed.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::ports::{Account, AuthToken, CredentialStore, CredentialStoreError};
use crate::outbound::cap_fs;

/// Stored credentials of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Account the record belongs to.
    pub account: Account,
    /// National id used as password, if still stored.
    #[serde(default)]
    pub secret: Option<String>,
    /// Session token from the last login.
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Cached key/value pairs.
    #[serde(default)]
    pub cached: BTreeMap<String, String>,
}

impl CredentialRecord {
    /// Empty record for an account named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            account: Account::new(name),
            secret: None,
            auth_token: None,
            cached: BTreeMap::new(),
        }
    }

    /// Set the stored secret.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Set the cached session token.
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Add a cached value.
    #[must_use]
    pub fn with_cached(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.cached.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Default, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    accounts: Vec<CredentialRecord>,
}

/// [`CredentialStore`] over a list of records, optionally persisted as JSON.
pub struct JsonCredentialStore {
    records: Mutex<Vec<CredentialRecord>>,
    path: Option<PathBuf>,
}

impl JsonCredentialStore {
    /// Store that never touches the filesystem.
    pub fn in_memory(records: Vec<CredentialRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            path: None,
        }
    }

    /// Load records from `path`; a missing file starts empty.
    ///
    /// # Errors
    ///
    /// [`CredentialStoreError::Storage`] when the file cannot be read or
    /// decoded.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CredentialStoreError> {
        let path = path.into();
        let file = match cap_fs::read_optional(&path).map_err(storage_error)? {
            Some(contents) => serde_json::from_str::<CredentialFile>(&contents)
                .map_err(|error| CredentialStoreError::storage(error.to_string()))?,
            None => CredentialFile::default(),
        };
        debug!(path = %path.display(), accounts = file.accounts.len(), "credentials loaded");
        Ok(Self {
            records: Mutex::new(file.accounts),
            path: Some(path),
        })
    }

    /// Copy of every stored record.
    pub async fn records(&self) -> Vec<CredentialRecord> {
        self.records.lock().await.clone()
    }

    async fn with_record<R: Send>(
        &self,
        account: &Account,
        mutate: bool,
        apply: impl FnOnce(&mut CredentialRecord) -> R + Send,
    ) -> Result<R, CredentialStoreError> {
        let mut records = self.records.lock().await;
        let record = records
            .iter_mut()
            .find(|record| record.account == *account)
            .ok_or_else(|| CredentialStoreError::unknown_account(account.name.clone()))?;
        let result = apply(record);
        if mutate {
            self.persist(&records)?;
        }
        Ok(result)
    }

    fn persist(&self, records: &[CredentialRecord]) -> Result<(), CredentialStoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let encoded = serde_json::to_vec_pretty(&CredentialFileRef { accounts: records })
            .map_err(|error| CredentialStoreError::storage(error.to_string()))?;
        cap_fs::write_replacing(path, &encoded).map_err(storage_error)
    }
}

#[derive(Serialize)]
struct CredentialFileRef<'a> {
    accounts: &'a [CredentialRecord],
}

fn storage_error(error: std::io::Error) -> CredentialStoreError {
    CredentialStoreError::storage(error.to_string())
}

#[async_trait]
impl CredentialStore for JsonCredentialStore {
    async fn accounts(&self) -> Result<Vec<Account>, CredentialStoreError> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .map(|record| record.account.clone())
            .collect())
    }

    async fn secret(&self, account: &Account) -> Result<Option<String>, CredentialStoreError> {
        self.with_record(account, false, |record| record.secret.clone())
            .await
    }

    async fn auth_token(
        &self,
        account: &Account,
    ) -> Result<Option<AuthToken>, CredentialStoreError> {
        self.with_record(account, false, |record| {
            record.auth_token.as_deref().map(AuthToken::new)
        })
        .await
    }

    async fn clear_secret(&self, account: &Account) -> Result<(), CredentialStoreError> {
        self.with_record(account, true, |record| record.secret = None)
            .await
    }

    async fn cached_value(
        &self,
        account: &Account,
        key: &str,
    ) -> Result<Option<String>, CredentialStoreError> {
        self.with_record(account, false, |record| record.cached.get(key).cloned())
            .await
    }

    async fn set_cached_value(
        &self,
        account: &Account,
        key: &str,
        value: &str,
    ) -> Result<(), CredentialStoreError> {
        self.with_record(account, true, |record| {
            record.cached.insert(key.to_owned(), value.to_owned());
        })
        .await
    }
}
