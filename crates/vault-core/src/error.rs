//! Error types for vault-core

use std::fmt;

use thiserror::Error;

/// Result type alias using vault-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vault-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// `SQLite` error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Cipher not found
    #[error("Cipher not found: {0}")]
    NotFound(String),

    /// Form validation failed; nothing was sent to storage
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Network is unavailable; nothing was sent to storage
    #[error("An internet connection is required")]
    NoConnection,

    /// Storage rejected the request
    #[error("Operation failed: {}", .messages.first().map_or("no details", String::as_str))]
    OperationFailed { messages: Vec<String> },

    /// Encryption or decryption failure
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation is not allowed in the session's current state
    #[error("Invalid session state: {0}")]
    InvalidState(String),
}

/// Form fields that carry validation rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
}

impl FormField {
    /// Machine-readable field name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
        }
    }

    /// Label shown to the user
    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Local validation failure raised before any I/O
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("The {field} field is required.")]
    RequiredFieldMissing { field: FormField },
}
