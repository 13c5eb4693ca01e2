//! vault-core - Core library for Vault
//!
//! This crate contains the cipher models, scope-aware encryption, the
//! collaborator contracts and the edit workflow shared by every Vault
//! front end.

pub mod config;
pub mod crypto;
pub mod db;
pub mod editor;
pub mod error;
pub mod generator;
pub mod models;
pub mod services;
pub mod util;

pub use crypto::{CryptoService, EncString, KeyRing};
pub use editor::{ActionOutcome, EditSession, FormState, SessionState};
pub use error::{Error, FormField, Result, ValidationError};
pub use models::{Cipher, CipherId, Folder, FolderId, LoginDetail, OrganizationId, Scope};
