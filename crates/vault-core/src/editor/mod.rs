//! Cipher edit workflow
//!
//! An [`EditSession`] loads one cipher, projects it into a plaintext
//! [`FormState`], validates edits and reconciles them back into an encrypted
//! cipher for storage. Storage, dialogs, connectivity and analytics are
//! reached only through [`crate::services::Collaborators`].

mod form;
pub mod messages;
mod session;

pub use form::{FolderOption, FolderOptions, FormState};
pub use session::{ActionOutcome, EditSession, SessionState, SharedSession};
