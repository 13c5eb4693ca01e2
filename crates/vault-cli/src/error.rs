use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] vault_core::Error),
    #[error(transparent)]
    Store(#[from] vault_core::services::StoreError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Cipher ID cannot be empty")]
    EmptyCipherId,
    #[error("The --name option is required when adding a login")]
    MissingName,
    #[error("Folder name cannot be empty")]
    EmptyFolderName,
    #[error("Cipher not found for id/prefix: {0}")]
    CipherNotFound(String),
    #[error("{0}")]
    AmbiguousCipherId(String),
    #[error("Folder not found: {0}")]
    FolderNotFound(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Nothing to change; pass at least one field option")]
    NothingToEdit,
    #[error("Secure storage error: {0}")]
    SecureStorage(String),
    #[error("Key not found for existing vault ({0}); refusing to create a new one")]
    MissingVaultKey(String),
}
