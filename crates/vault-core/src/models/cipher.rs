//! Cipher model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::uuid_id;
use crate::crypto::EncString;
use crate::models::FolderId;

uuid_id!(
    /// A unique identifier for a cipher, using UUID v7 (time-sortable)
    CipherId
);

/// Identifier of an organization that shares ciphers with the user.
///
/// Issued by the server, so it is kept as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationId(String);

impl OrganizationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encryption context a cipher's fields are sealed under
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The user's own key
    Personal,
    /// A key shared by every member of the organization
    Organization(OrganizationId),
}

impl Scope {
    /// Scope selected by an optional organization
    pub fn from_organization(organization_id: Option<&OrganizationId>) -> Self {
        organization_id.map_or(Self::Personal, |id| Self::Organization(id.clone()))
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Personal => f.write_str("personal"),
            Self::Organization(id) => write!(f, "organization:{id}"),
        }
    }
}

/// Login metadata of a cipher; every field is encrypted in the cipher's scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginDetail {
    pub uri: Option<EncString>,
    pub username: Option<EncString>,
    pub password: Option<EncString>,
    pub totp: Option<EncString>,
}

impl LoginDetail {
    /// True when no login field carries a value
    pub const fn is_empty(&self) -> bool {
        self.uri.is_none()
            && self.username.is_none()
            && self.password.is_none()
            && self.totp.is_none()
    }
}

/// A stored secret item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cipher {
    /// Unique identifier
    pub id: CipherId,
    /// Owning organization; `None` for personal ciphers
    pub organization_id: Option<OrganizationId>,
    /// Containing folder; `None` means "no folder"
    pub folder_id: Option<FolderId>,
    /// Favorite flag
    pub favorite: bool,
    /// Encrypted display name (required)
    pub name: EncString,
    /// Encrypted free-form notes
    pub notes: Option<EncString>,
    /// Login metadata
    pub login: Option<LoginDetail>,
    /// Last update timestamp (Unix ms), maintained by storage
    pub revision_date: i64,
}

impl Cipher {
    /// Create a personal cipher with the given encrypted name
    #[must_use]
    pub fn new(name: EncString) -> Self {
        Self {
            id: CipherId::new(),
            organization_id: None,
            folder_id: None,
            favorite: false,
            name,
            notes: None,
            login: None,
            revision_date: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Encryption scope of every field in this cipher
    pub fn scope(&self) -> Scope {
        Scope::from_organization(self.organization_id.as_ref())
    }
}
