//! Key ring persistence.
//!
//! The key ring lives in the OS keychain under an entry named after the vault
//! database. Passing `--key-path` (or `VAULT_KEY_PATH`) keeps it in a key file
//! instead, readable only by its owner.

#[cfg(test)]
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;
use tempfile::NamedTempFile;
use vault_core::KeyRing;

use crate::error::CliError;

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "vault-cli";

/// Where a vault's key ring is kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyStore {
    Keychain { username: String },
    File { path: PathBuf },
}

impl KeyStore {
    /// Key storage for the vault at `db_path`, or the explicit key file
    pub fn for_vault(db_path: &Path, key_path: Option<&Path>) -> Result<Self, CliError> {
        if let Some(path) = key_path {
            return Ok(Self::File {
                path: path.to_path_buf(),
            });
        }

        let db_path = fs::canonicalize(db_path)?;
        Ok(Self::Keychain {
            username: format!("vault_keys:{}", db_path.display()),
        })
    }

    /// Human-readable location for messages
    pub fn location(&self) -> String {
        match self {
            Self::Keychain { username } => format!("keychain entry {username}"),
            Self::File { path } => path.display().to_string(),
        }
    }

    pub fn load(&self) -> Result<Option<KeyRing>, CliError> {
        let raw = match self {
            Self::Keychain { username } => read_keychain(username)?,
            Self::File { path } => read_key_file(path)?,
        };
        Ok(raw.as_deref().map(KeyRing::from_json).transpose()?)
    }

    pub fn save(&self, keys: &KeyRing) -> Result<(), CliError> {
        let raw = keys.to_json()?;
        match self {
            Self::Keychain { username } => write_keychain(username, &raw),
            Self::File { path } => write_key_file(path, &raw),
        }
    }
}

#[cfg(test)]
fn test_store() -> &'static Mutex<HashMap<String, String>> {
    static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
    STORE.get_or_init(|| Mutex::new(HashMap::new()))
}

#[cfg(not(test))]
fn entry(username: &str) -> Result<Entry, CliError> {
    Entry::new(KEYRING_SERVICE_NAME, username)
        .map_err(|error| CliError::SecureStorage(error.to_string()))
}

#[cfg(not(test))]
fn read_keychain(username: &str) -> Result<Option<String>, CliError> {
    match entry(username)?.get_password() {
        Ok(raw) => Ok(Some(raw)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(error) => Err(CliError::SecureStorage(error.to_string())),
    }
}

#[cfg(test)]
fn read_keychain(username: &str) -> Result<Option<String>, CliError> {
    let guard = test_store()
        .lock()
        .map_err(|error| CliError::SecureStorage(error.to_string()))?;
    Ok(guard.get(username).cloned())
}

#[cfg(not(test))]
fn write_keychain(username: &str, raw: &str) -> Result<(), CliError> {
    entry(username)?
        .set_password(raw)
        .map_err(|error| CliError::SecureStorage(error.to_string()))
}

#[cfg(test)]
fn write_keychain(username: &str, raw: &str) -> Result<(), CliError> {
    let mut guard = test_store()
        .lock()
        .map_err(|error| CliError::SecureStorage(error.to_string()))?;
    guard.insert(username.to_string(), raw.to_string());
    Ok(())
}

fn read_key_file(path: &Path) -> Result<Option<String>, CliError> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(raw)),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// Replace the key file atomically. The temp file is created owner-only
/// (0600 on Unix) and renamed over the target.
fn write_key_file(path: &Path, raw: &str) -> Result<(), CliError> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(raw.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|error| error.error)?;
    Ok(())
}
