//! Driven port for local storage of one synchronised collection.
//!
//! Inserts refuse duplicate ids so the reconciler can tell "new" from
//! "existing" without a prior read.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::entities::SyncEntity;

define_port_error! {
    /// Errors raised by local entity storage.
    pub enum EntityStoreError {
        /// Insert refused because a record with the same id already exists.
        UniqueConflict { id: String } =>
            "a record with id {id} already exists",
        /// Update or delete targeted a record that does not exist.
        Missing { id: String } =>
            "no record with id {id}",
        /// Storage could not be reached.
        Connection { message: String } =>
            "local store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "local store query failed: {message}",
    }
}

impl EntityStoreError {
    /// Whether this error reports a duplicate id on insert.
    pub fn is_unique_conflict(&self) -> bool {
        matches!(self, Self::UniqueConflict { .. })
    }
}

/// CRUD access to the local copy of one collection.
#[async_trait]
pub trait EntityStore<T: SyncEntity>: Send + Sync {
    /// Insert a new record.
    ///
    /// # Errors
    ///
    /// Returns [`EntityStoreError::UniqueConflict`] when `item`'s id exists.
    async fn insert(&self, item: &T) -> Result<(), EntityStoreError>;

    /// Replace the stored record sharing `item`'s id.
    async fn update(&self, item: &T) -> Result<(), EntityStoreError>;

    /// Remove the stored record sharing `item`'s id.
    async fn delete(&self, item: &T) -> Result<(), EntityStoreError>;

    /// Look up one record by id.
    async fn find(&self, id: &T::Id) -> Result<Option<T>, EntityStoreError>;

    /// Return the full local snapshot.
    async fn list_all(&self) -> Result<Vec<T>, EntityStoreError>;
}
