//! Folder model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::uuid_id;
use crate::crypto::EncString;

uuid_id!(
    /// A unique identifier for a folder
    FolderId
);

/// A user-defined grouping label.
///
/// Folder names always live in the personal scope, even when the ciphers
/// filed under them belong to an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    /// Unique identifier
    pub id: FolderId,
    /// Encrypted display name
    pub name: EncString,
}

impl Folder {
    /// Create a folder with a fresh ID
    #[must_use]
    pub fn new(name: EncString) -> Self {
        Self {
            id: FolderId::new(),
            name,
        }
    }
}
