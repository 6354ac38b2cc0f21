//! JSON snapshot of the local store, read and written through `cap_std`.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::entities::{Customer, Event, Member, Order, PaymentMethod, PersonalLedger};
use crate::outbound::cap_fs;

/// Serialisable contents of every local collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalSnapshot {
    /// Membership directory.
    pub members: Vec<Member>,
    /// Personal ledgers.
    pub ledgers: Vec<PersonalLedger>,
    /// Shop customers.
    pub customers: Vec<Customer>,
    /// Shop orders.
    pub orders: Vec<Order>,
    /// Shop events.
    pub events: Vec<Event>,
    /// Shop payment methods.
    pub payments: Vec<PaymentMethod>,
}

/// Errors reading or writing a snapshot file.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Filesystem access failed.
    #[error("snapshot I/O failed at {path}: {source}")]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Snapshot contents are not valid JSON for [`LocalSnapshot`].
    #[error("snapshot at {path} is malformed: {source}")]
    Json {
        /// Path being decoded or encoded.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

impl SnapshotError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Location of a snapshot on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    /// Snapshot stored at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot; a missing file yields an empty snapshot.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::Io`] when the file cannot be read and
    /// [`SnapshotError::Json`] when it does not decode.
    pub fn load(&self) -> Result<LocalSnapshot, SnapshotError> {
        let Some(contents) =
            cap_fs::read_optional(&self.path).map_err(|error| SnapshotError::io(&self.path, error))?
        else {
            debug!(path = %self.path.display(), "no snapshot yet; starting empty");
            return Ok(LocalSnapshot::default());
        };
        serde_json::from_str(&contents).map_err(|error| SnapshotError::json(&self.path, error))
    }

    /// Write `snapshot`, replacing any previous file in one rename.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::Io`] when the directory or file cannot be written.
    pub fn save(&self, snapshot: &LocalSnapshot) -> Result<(), SnapshotError> {
        let encoded = serde_json::to_vec_pretty(snapshot)
            .map_err(|error| SnapshotError::json(&self.path, error))?;
        cap_fs::write_replacing(&self.path, &encoded)
            .map_err(|error| SnapshotError::io(&self.path, error))?;
        debug!(path = %self.path.display(), "snapshot saved");
        Ok(())
    }
}
