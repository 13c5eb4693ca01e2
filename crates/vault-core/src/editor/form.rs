//! Plaintext edit buffer and its projection to and from a cipher

use crate::crypto::{CryptoService, EncString};
use crate::editor::messages;
use crate::error::{FormField, Result, ValidationError};
use crate::models::{Cipher, Folder, FolderId, LoginDetail, Scope};
use crate::util::non_blank;

/// One selectable entry of the folder picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderOption {
    /// `None` for the synthetic "no folder" entry
    pub id: Option<FolderId>,
    /// Decrypted display name
    pub label: String,
}

/// Folder picker entries for one session.
///
/// Index 0 is always the synthetic "no folder" entry; the user's folders
/// follow, sorted by decrypted name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderOptions {
    options: Vec<FolderOption>,
}

impl FolderOptions {
    /// Decrypt and sort the given folders behind a "no folder" entry
    pub fn build(folders: Vec<Folder>, crypto: &dyn CryptoService) -> Result<Self> {
        let mut named = folders
            .into_iter()
            .map(|folder| {
                let label = crypto.decrypt(&folder.name, &Scope::Personal)?;
                Ok(FolderOption {
                    id: Some(folder.id),
                    label,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        named.sort_by(|a, b| {
            a.label
                .to_lowercase()
                .cmp(&b.label.to_lowercase())
                .then_with(|| a.label.cmp(&b.label))
        });

        let mut options = Vec::with_capacity(named.len() + 1);
        options.push(FolderOption {
            id: None,
            label: messages::FOLDER_NONE.to_string(),
        });
        options.extend(named);
        Ok(Self { options })
    }

    /// Picker index of a folder; 0 when `folder_id` is `None` or unknown
    pub fn index_of(&self, folder_id: Option<&FolderId>) -> usize {
        let Some(folder_id) = folder_id else {
            return 0;
        };
        self.options
            .iter()
            .position(|option| option.id.as_ref() == Some(folder_id))
            .unwrap_or(0)
    }

    /// Folder selected by a picker index; `None` for index 0 or out of range
    pub fn folder_id_at(&self, index: usize) -> Option<FolderId> {
        if index == 0 {
            return None;
        }
        self.options.get(index).and_then(|option| option.id)
    }

    /// Picker index of the first folder whose name matches, ignoring case
    pub fn find_by_label(&self, label: &str) -> Option<usize> {
        let label = label.trim().to_lowercase();
        self.options
            .iter()
            .position(|option| option.label.to_lowercase() == label)
    }

    pub fn options(&self) -> &[FolderOption] {
        &self.options
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(|option| option.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Never true: the "no folder" entry is always present
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// Editable plaintext view of a cipher
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub name: String,
    pub uri: String,
    pub username: String,
    pub password: String,
    pub totp: String,
    pub notes: String,
    pub favorite: bool,
    /// Index into the session's [`FolderOptions`]; 0 = no folder
    pub selected_folder_index: usize,
}

impl FormState {
    /// Decrypt a cipher into form fields; absent values become empty strings
    pub fn project(
        cipher: &Cipher,
        folders: &FolderOptions,
        crypto: &dyn CryptoService,
    ) -> Result<Self> {
        let scope = cipher.scope();
        let open = |value: Option<&EncString>| -> Result<String> {
            value.map_or_else(|| Ok(String::new()), |v| crypto.decrypt(v, &scope))
        };
        let login = cipher.login.as_ref();

        Ok(Self {
            name: open(Some(&cipher.name))?,
            uri: open(login.and_then(|l| l.uri.as_ref()))?,
            username: open(login.and_then(|l| l.username.as_ref()))?,
            password: open(login.and_then(|l| l.password.as_ref()))?,
            totp: open(login.and_then(|l| l.totp.as_ref()))?,
            notes: open(cipher.notes.as_ref())?,
            favorite: cipher.favorite,
            selected_folder_index: folders.index_of(cipher.folder_id.as_ref()),
        })
    }

    /// Check required fields. Pure: no I/O and no encryption.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: FormField::Name,
            });
        }
        Ok(())
    }

    /// Build the cipher to store from this form and the cipher it was loaded from.
    ///
    /// Identity and scope are copied from `existing`. Blank optional fields
    /// become `None`. A field whose plaintext is unchanged keeps its existing
    /// ciphertext. The login block is always present, even when every login
    /// field is blank.
    pub fn to_record(
        &self,
        existing: &Cipher,
        folders: &FolderOptions,
        crypto: &dyn CryptoService,
    ) -> Result<Cipher> {
        self.validate()?;

        let sealer = Sealer {
            crypto,
            scope: existing.scope(),
        };
        let old_login = existing.login.as_ref();

        let login = LoginDetail {
            uri: sealer.seal_optional(&self.uri, old_login.and_then(|l| l.uri.as_ref()))?,
            username: sealer
                .seal_optional(&self.username, old_login.and_then(|l| l.username.as_ref()))?,
            password: sealer
                .seal_optional(&self.password, old_login.and_then(|l| l.password.as_ref()))?,
            totp: sealer.seal_optional(&self.totp, old_login.and_then(|l| l.totp.as_ref()))?,
        };

        Ok(Cipher {
            id: existing.id,
            organization_id: existing.organization_id.clone(),
            folder_id: folders.folder_id_at(self.selected_folder_index),
            favorite: self.favorite,
            name: sealer.seal(self.name.trim(), Some(&existing.name))?,
            notes: sealer.seal_optional(&self.notes, existing.notes.as_ref())?,
            login: Some(login),
            revision_date: existing.revision_date,
        })
    }
}

/// Encrypts form values in one scope, reusing ciphertext for unchanged values
struct Sealer<'a> {
    crypto: &'a dyn CryptoService,
    scope: Scope,
}

impl Sealer<'_> {
    fn seal(&self, plaintext: &str, existing: Option<&EncString>) -> Result<EncString> {
        if let Some(existing) = existing {
            if self
                .crypto
                .decrypt(existing, &self.scope)
                .is_ok_and(|current| current == plaintext)
            {
                return Ok(existing.clone());
            }
        }
        self.crypto.encrypt(plaintext, &self.scope)
    }

    fn seal_optional(
        &self,
        plaintext: &str,
        existing: Option<&EncString>,
    ) -> Result<Option<EncString>> {
        non_blank(plaintext)
            .map(|value| self.seal(value, existing))
            .transpose()
    }
}
