//! `SQLite` storage for Vault

mod connection;
mod migrations;
mod repository;

pub use connection::Database;
pub use repository::{SqliteCipherStore, CIPHER_NOT_FOUND};
