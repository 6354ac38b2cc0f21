//! Membership directory records.

use serde::{Deserialize, Serialize};

use super::{EntityKind, SyncEntity};

/// One record of the membership directory.
///
/// A member whose `parent_member_id` is set is *associated* with that parent:
/// the engine re-authenticates as the associated member to pull its ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Directory identifier.
    pub id: i64,
    /// Display name, also used as the login name of associated members.
    pub name: String,
    /// National identity document, doubling as the member's secret.
    pub national_id: Option<String>,
    /// Identifier of the member this one is associated with.
    pub parent_member_id: Option<i64>,
}

impl Member {
    /// Build a member with no national id and no association.
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            national_id: None,
            parent_member_id: None,
        }
    }

    /// Attach a national identity document.
    #[must_use]
    pub fn with_national_id(mut self, national_id: impl Into<String>) -> Self {
        self.national_id = Some(national_id.into());
        self
    }

    /// Mark the member as associated with `parent_member_id`.
    #[must_use]
    pub fn associated_with(mut self, parent_member_id: i64) -> Self {
        self.parent_member_id = Some(parent_member_id);
        self
    }
}

impl SyncEntity for Member {
    type Id = i64;

    const KIND: EntityKind = EntityKind::Members;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
