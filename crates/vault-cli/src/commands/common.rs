use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use vault_core::db::{Database, SqliteCipherStore};
use vault_core::editor::FolderOptions;
use vault_core::services::{CipherStore, Collaborators, TracingEventSink};
use vault_core::util::non_blank;
use vault_core::{Cipher, CipherId, CryptoService, FormState, KeyRing, OrganizationId};

use crate::cli::FieldArgs;
use crate::config::CliConfig;
use crate::dialogs::{StaticConnectivity, TerminalDialogs};
use crate::error::CliError;
use crate::keystore::KeyStore;

const SHORT_ID_LEN: usize = 13;
const PASSWORD_MASK: &str = "********";

/// Location of the vault database and, optionally, its key file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultPaths {
    pub db: PathBuf,
    pub key: Option<PathBuf>,
}

impl VaultPaths {
    /// CLI flag, then environment variable, then the platform data directory.
    /// Without a key file the keys live in the OS keychain.
    pub fn resolve(
        cli_db_path: Option<PathBuf>,
        cli_key_path: Option<PathBuf>,
    ) -> Result<Self, CliError> {
        Ok(Self {
            db: resolve_path(cli_db_path, env::var_os("VAULT_DB_PATH"), default_db_path)?,
            key: cli_key_path.or_else(|| env::var_os("VAULT_KEY_PATH").map(PathBuf::from)),
        })
    }
}

pub fn resolve_path(
    cli_path: Option<PathBuf>,
    env_path: Option<OsString>,
    default: impl FnOnce() -> Result<PathBuf, CliError>,
) -> Result<PathBuf, CliError> {
    match cli_path.or_else(|| env_path.map(PathBuf::from)) {
        Some(path) => Ok(path),
        None => default(),
    }
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("vault").join("vault.db"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))
}

/// An opened vault: storage plus the keys that seal its values
pub struct Vault {
    pub store: SqliteCipherStore,
    pub keys: Arc<KeyRing>,
    key_store: KeyStore,
}

/// Open the vault database and its key ring.
///
/// A key ring is generated only for a vault with no ciphers or folders. A
/// populated vault whose keys cannot be found is an error.
pub async fn open_vault(paths: &VaultPaths) -> Result<Vault, CliError> {
    let store = SqliteCipherStore::new(Database::open(&paths.db)?);
    let key_store = KeyStore::for_vault(&paths.db, paths.key.as_deref())?;

    let keys = match key_store.load()? {
        Some(keys) => keys,
        None if store.is_empty().await? => {
            let keys = KeyRing::generate();
            key_store.save(&keys)?;
            tracing::info!(location = %key_store.location(), "Created vault keys");
            keys
        }
        None => return Err(CliError::MissingVaultKey(key_store.location())),
    };
    tracing::debug!(db = %paths.db.display(), "Opened vault");

    Ok(Vault {
        store,
        keys: Arc::new(keys),
        key_store,
    })
}

impl Vault {
    /// Collaborators for an edit session driven from the terminal
    pub fn collaborators(&self, config: &CliConfig, assume_yes: bool) -> Collaborators {
        Collaborators {
            store: Arc::new(self.store.clone()),
            crypto: Arc::clone(&self.keys) as Arc<dyn CryptoService>,
            connectivity: Arc::new(StaticConnectivity::new(!config.offline)),
            dialogs: Arc::new(TerminalDialogs::new(assume_yes)),
            events: Arc::new(TracingEventSink),
        }
    }

    /// Make sure the key ring can seal values for `organization_id`
    pub fn ensure_organization_key(
        &mut self,
        organization_id: &OrganizationId,
    ) -> Result<(), CliError> {
        if self.keys.organizations().any(|known| known == organization_id) {
            return Ok(());
        }

        let mut keys = (*self.keys).clone();
        keys.add_organization(organization_id.clone());
        self.key_store.save(&keys)?;
        tracing::info!(organization = %organization_id, "Added organization key");
        self.keys = Arc::new(keys);
        Ok(())
    }

    pub async fn folder_options(&self) -> Result<FolderOptions, CliError> {
        let folders = self.store.list_folders().await?;
        Ok(FolderOptions::build(folders, self.keys.as_ref())?)
    }
}

pub fn normalize_cipher_identifier(id: &str) -> Result<String, CliError> {
    non_blank(id)
        .map(|id| id.trim().to_string())
        .ok_or(CliError::EmptyCipherId)
}

/// Resolve a full cipher ID or a unique ID prefix
pub async fn resolve_cipher_id(
    query: &str,
    store: &SqliteCipherStore,
) -> Result<CipherId, CliError> {
    if let Ok(cipher_id) = query.parse::<CipherId>() {
        if store.get_cipher(&cipher_id).await?.is_some() {
            return Ok(cipher_id);
        }
    }

    let matching_ids = store.find_cipher_ids_by_prefix(query, 3).await?;

    match matching_ids.as_slice() {
        [] => Err(CliError::CipherNotFound(query.to_string())),
        [cipher_id] => Ok(*cipher_id),
        _ => {
            let options = matching_ids
                .iter()
                .map(|id| short_id(*id))
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousCipherId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn short_id(id: CipherId) -> String {
    id.to_string().chars().take(SHORT_ID_LEN).collect()
}

/// Copy the plain field options onto a form.
///
/// The TOTP key and password generation are applied by the caller.
pub fn apply_fields(
    form: &mut FormState,
    fields: &FieldArgs,
    folders: &FolderOptions,
) -> Result<(), CliError> {
    let targets = [
        (&fields.name, &mut form.name),
        (&fields.uri, &mut form.uri),
        (&fields.username, &mut form.username),
        (&fields.password, &mut form.password),
        (&fields.notes, &mut form.notes),
    ];
    for (value, target) in targets {
        if let Some(value) = value {
            target.clone_from(value);
        }
    }

    if let Some(favorite) = fields.favorite_flag() {
        form.favorite = favorite;
    }

    if let Some(folder) = fields.folder.as_deref() {
        form.selected_folder_index = match non_blank(folder) {
            None => 0,
            Some(label) => folders
                .find_by_label(label)
                .ok_or_else(|| CliError::FolderNotFound(label.trim().to_string()))?,
        };
    }

    Ok(())
}

/// Decrypted view of a cipher for display
#[derive(Debug, Serialize)]
pub struct CipherView {
    pub id: String,
    pub name: String,
    pub uri: String,
    pub username: String,
    pub password: String,
    pub totp: String,
    pub notes: String,
    pub folder: Option<String>,
    pub favorite: bool,
    pub organization_id: Option<String>,
    pub revision_date: i64,
    pub updated: String,
}

impl CipherView {
    /// Mask the password and authenticator key
    #[must_use]
    pub fn redacted(mut self) -> Self {
        if !self.password.is_empty() {
            self.password = PASSWORD_MASK.to_string();
        }
        if !self.totp.is_empty() {
            self.totp = PASSWORD_MASK.to_string();
        }
        self
    }
}

pub fn cipher_view(
    cipher: &Cipher,
    folders: &FolderOptions,
    crypto: &dyn CryptoService,
) -> Result<CipherView, CliError> {
    let form = FormState::project(cipher, folders, crypto)?;
    let folder = folders
        .options()
        .get(form.selected_folder_index)
        .filter(|option| option.id.is_some())
        .map(|option| option.label.clone());

    Ok(CipherView {
        id: cipher.id.to_string(),
        name: form.name,
        uri: form.uri,
        username: form.username,
        password: form.password,
        totp: form.totp,
        notes: form.notes,
        folder,
        favorite: form.favorite,
        organization_id: cipher.organization_id.as_ref().map(ToString::to_string),
        revision_date: cipher.revision_date,
        updated: format_timestamp(cipher.revision_date),
    })
}

pub fn format_cipher_lines(views: &[CipherView]) -> Vec<String> {
    views
        .iter()
        .map(|view| {
            let short_id = view.id.chars().take(SHORT_ID_LEN).collect::<String>();
            let marker = if view.favorite { "*" } else { " " };
            let folder = view.folder.as_deref().unwrap_or("");

            format!(
                "{short_id:<13} {marker} {:<30}  {:<30}  {folder}",
                view.name, view.username
            )
            .trim_end()
            .to_string()
        })
        .collect()
}

pub fn format_cipher_details(view: &CipherView) -> Vec<String> {
    let mut lines = vec![
        format!("ID:        {}", view.id),
        format!("Name:      {}", view.name),
    ];
    let optional = [
        ("URI", view.uri.as_str()),
        ("Username", view.username.as_str()),
        ("Password", view.password.as_str()),
        ("TOTP", view.totp.as_str()),
        ("Folder", view.folder.as_deref().unwrap_or("")),
        ("Org", view.organization_id.as_deref().unwrap_or("")),
    ];
    for (label, value) in optional {
        if !value.is_empty() {
            lines.push(format!("{:<10} {value}", format!("{label}:")));
        }
    }
    if view.favorite {
        lines.push("Favorite:  yes".to_string());
    }
    lines.push(format!("Updated:   {}", view.updated));
    if !view.notes.is_empty() {
        lines.push(String::new());
        lines.extend(view.notes.lines().map(ToString::to_string));
    }
    lines
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |datetime| datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}
