//! Collaborator contracts consumed by the edit workflow.
//!
//! Storage, connectivity, dialogs and analytics are owned by the host
//! application; the workflow only talks to them through these traits, which
//! are injected explicitly through [`Collaborators`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::crypto::CryptoService;
use crate::error::Error;
use crate::models::{Cipher, CipherId, Folder};

/// Failure reported by a storage backend.
///
/// `messages` carries the structured, user-presentable errors returned by the
/// backend; it may be empty when the backend gave no detail.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
#[error("{}", .messages.first().map_or("Storage request failed", String::as_str))]
pub struct StoreError {
    pub messages: Vec<String>,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
        }
    }

    /// A failure without any structured detail
    pub const fn unspecified() -> Self {
        Self {
            messages: Vec::new(),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        Self::new(error.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(error.to_string())
    }
}

impl From<Error> for StoreError {
    fn from(error: Error) -> Self {
        match error {
            Error::OperationFailed { messages } => Self { messages },
            other => Self::new(other.to_string()),
        }
    }
}

impl From<StoreError> for Error {
    fn from(error: StoreError) -> Self {
        Self::OperationFailed {
            messages: error.messages,
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistent cipher storage (possibly network-backed)
#[async_trait]
pub trait CipherStore: Send + Sync {
    /// Get a cipher by ID
    async fn get_cipher(&self, id: &CipherId) -> StoreResult<Option<Cipher>>;

    /// List every folder of the user
    async fn list_folders(&self) -> StoreResult<Vec<Folder>>;

    /// Replace a stored cipher with the given value
    async fn update_cipher(&self, cipher: &Cipher) -> StoreResult<()>;

    /// Delete a cipher
    async fn delete_cipher(&self, id: &CipherId) -> StoreResult<()>;
}

/// Network availability probe
pub trait Connectivity: Send + Sync {
    fn is_connected(&self) -> bool;
}

/// User-facing prompts and notifications
#[async_trait]
pub trait Dialogs: Send + Sync {
    /// Ask a yes/no question; `true` means the user agreed
    async fn confirm(&self, prompt: &str) -> bool;

    /// Blocking error or warning message
    fn alert(&self, title: &str, message: &str);

    /// Transient informational message
    fn toast(&self, message: &str);

    fn show_busy(&self, message: &str);

    fn hide_busy(&self);
}

/// Analytics-style events emitted by the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorEvent {
    EditedLogin,
    DeletedLogin,
}

impl EditorEvent {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EditedLogin => "EditedLogin",
            Self::DeletedLogin => "DeletedLogin",
        }
    }
}

impl fmt::Display for EditorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fire-and-forget event sink
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EditorEvent);
}

/// Event sink that records events in the application log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: EditorEvent) {
        tracing::info!(event = event.as_str(), "App event");
    }
}

/// Everything an edit session needs from its host
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn CipherStore>,
    pub crypto: Arc<dyn CryptoService>,
    pub connectivity: Arc<dyn Connectivity>,
    pub dialogs: Arc<dyn Dialogs>,
    pub events: Arc<dyn EventSink>,
}

/// Keeps the busy indicator visible for as long as the guard lives
pub(crate) struct BusyGuard<'a> {
    dialogs: &'a dyn Dialogs,
}

impl<'a> BusyGuard<'a> {
    pub(crate) fn show(dialogs: &'a dyn Dialogs, message: &str) -> Self {
        dialogs.show_busy(message);
        Self { dialogs }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.dialogs.hide_busy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_displays_first_message() {
        let error = StoreError {
            messages: vec!["Item is locked.".to_string(), "Other".to_string()],
        };
        assert_eq!(error.to_string(), "Item is locked.");
        assert_eq!(StoreError::unspecified().to_string(), "Storage request failed");
    }

    #[test]
    fn store_error_converts_to_operation_failed() {
        let error: Error = StoreError::new("Cipher not found.").into();
        assert!(matches!(
            error,
            Error::OperationFailed { ref messages } if messages == &["Cipher not found.".to_string()]
        ));
    }

    #[test]
    fn event_names_are_stable() {
        assert_eq!(EditorEvent::EditedLogin.to_string(), "EditedLogin");
        assert_eq!(EditorEvent::DeletedLogin.to_string(), "DeletedLogin");
    }
}
