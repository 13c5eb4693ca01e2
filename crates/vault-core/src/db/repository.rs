//! Cipher and folder storage backed by `SQLite`

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::Mutex;

use crate::crypto::EncString;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{Cipher, CipherId, Folder, FolderId, LoginDetail, OrganizationId};
use crate::services::{CipherStore, StoreError, StoreResult};
use crate::util::unix_timestamp_millis;

const CIPHER_COLUMNS: &str =
    "id, organization_id, folder_id, favorite, name, notes, login, revision_date";

/// Message reported when an update or delete targets a missing cipher
pub const CIPHER_NOT_FOUND: &str = "Cipher not found.";

/// Thread-safe `SQLite` implementation of [`CipherStore`]
#[derive(Clone)]
pub struct SqliteCipherStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteCipherStore {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Open an in-memory store (primarily for tests)
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    /// Insert a new cipher
    pub async fn create_cipher(&self, cipher: &Cipher) -> Result<()> {
        let db = self.db.lock().await;
        insert_cipher(db.connection(), cipher)
    }

    /// List ciphers, most recently revised first
    pub async fn list_ciphers(&self) -> Result<Vec<Cipher>> {
        let db = self.db.lock().await;
        query_ciphers(db.connection())
    }

    /// Insert a new folder
    pub async fn create_folder(&self, folder: &Folder) -> Result<()> {
        let db = self.db.lock().await;
        db.connection().execute(
            "INSERT INTO folders (id, name, revision_date) VALUES (?, ?, ?)",
            params![
                folder.id.as_str(),
                folder.name.as_str(),
                unix_timestamp_millis()
            ],
        )?;
        Ok(())
    }

    /// Whether the vault holds no ciphers and no folders yet
    pub async fn is_empty(&self) -> Result<bool> {
        let db = self.db.lock().await;
        let empty = db.connection().query_row(
            "SELECT NOT EXISTS (SELECT 1 FROM ciphers) AND NOT EXISTS (SELECT 1 FROM folders)",
            [],
            |row| row.get(0),
        )?;
        Ok(empty)
    }

    /// Cipher IDs starting with `prefix`, for resolving abbreviated IDs
    pub async fn find_cipher_ids_by_prefix(
        &self,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<CipherId>> {
        let db = self.db.lock().await;
        let mut stmt = db.connection().prepare(
            "SELECT id FROM ciphers WHERE id LIKE ? || '%' ESCAPE '\\' ORDER BY id LIMIT ?",
        )?;
        let escaped = prefix
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");

        let ids = stmt
            .query_map(params![escaped, limit as i64], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        ids.iter()
            .map(|id| {
                id.parse()
                    .map_err(|_| Error::InvalidInput(format!("Invalid cipher ID in storage: {id}")))
            })
            .collect()
    }
}

#[async_trait]
impl CipherStore for SqliteCipherStore {
    async fn get_cipher(&self, id: &CipherId) -> StoreResult<Option<Cipher>> {
        let db = self.db.lock().await;
        Ok(select_cipher(db.connection(), id)?)
    }

    async fn list_folders(&self) -> StoreResult<Vec<Folder>> {
        let db = self.db.lock().await;
        Ok(query_folders(db.connection())?)
    }

    async fn update_cipher(&self, cipher: &Cipher) -> StoreResult<()> {
        let db = self.db.lock().await;
        let login = cipher.login.as_ref().map(serde_json::to_string).transpose()?;

        let rows = db.connection().execute(
            "UPDATE ciphers
             SET organization_id = ?, folder_id = ?, favorite = ?, name = ?, notes = ?,
                 login = ?, revision_date = ?
             WHERE id = ?",
            params![
                cipher.organization_id.as_ref().map(OrganizationId::as_str),
                cipher.folder_id.map(|id| id.as_str()),
                i32::from(cipher.favorite),
                cipher.name.as_str(),
                cipher.notes.as_ref().map(EncString::as_str),
                login,
                unix_timestamp_millis(),
                cipher.id.as_str(),
            ],
        )?;

        if rows == 0 {
            return Err(StoreError::new(CIPHER_NOT_FOUND));
        }
        tracing::debug!(cipher_id = %cipher.id, "Stored cipher update");
        Ok(())
    }

    async fn delete_cipher(&self, id: &CipherId) -> StoreResult<()> {
        let db = self.db.lock().await;
        let rows = db
            .connection()
            .execute("DELETE FROM ciphers WHERE id = ?", params![id.as_str()])?;

        if rows == 0 {
            return Err(StoreError::new(CIPHER_NOT_FOUND));
        }
        Ok(())
    }
}

fn insert_cipher(conn: &Connection, cipher: &Cipher) -> Result<()> {
    let login = cipher
        .login
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    conn.execute(
        "INSERT INTO ciphers (id, organization_id, folder_id, favorite, name, notes, login, revision_date)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            cipher.id.as_str(),
            cipher.organization_id.as_ref().map(OrganizationId::as_str),
            cipher.folder_id.map(|id| id.as_str()),
            i32::from(cipher.favorite),
            cipher.name.as_str(),
            cipher.notes.as_ref().map(EncString::as_str),
            login,
            cipher.revision_date,
        ],
    )?;
    Ok(())
}

fn select_cipher(conn: &Connection, id: &CipherId) -> Result<Option<Cipher>> {
    let row = conn
        .query_row(
            &format!("SELECT {CIPHER_COLUMNS} FROM ciphers WHERE id = ?"),
            params![id.as_str()],
            CipherRow::from_row,
        )
        .optional()?;
    row.map(CipherRow::into_cipher).transpose()
}

fn query_ciphers(conn: &Connection) -> Result<Vec<Cipher>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CIPHER_COLUMNS} FROM ciphers ORDER BY revision_date DESC, id"
    ))?;
    let rows = stmt
        .query_map([], CipherRow::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(CipherRow::into_cipher).collect()
}

fn query_folders(conn: &Connection) -> Result<Vec<Folder>> {
    let mut stmt = conn.prepare("SELECT id, name FROM folders ORDER BY revision_date, id")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(id, name)| {
            Ok(Folder {
                id: parse_id(&id)?,
                name: EncString::from_raw(name),
            })
        })
        .collect()
}

/// Raw column values of a cipher row
struct CipherRow {
    id: String,
    organization_id: Option<String>,
    folder_id: Option<String>,
    favorite: bool,
    name: String,
    notes: Option<String>,
    login: Option<String>,
    revision_date: i64,
}

impl CipherRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            organization_id: row.get(1)?,
            folder_id: row.get(2)?,
            favorite: row.get::<_, i32>(3)? != 0,
            name: row.get(4)?,
            notes: row.get(5)?,
            login: row.get(6)?,
            revision_date: row.get(7)?,
        })
    }

    fn into_cipher(self) -> Result<Cipher> {
        let login = self
            .login
            .as_deref()
            .map(serde_json::from_str::<LoginDetail>)
            .transpose()?;

        Ok(Cipher {
            id: parse_id(&self.id)?,
            organization_id: self.organization_id.map(OrganizationId::new),
            folder_id: self.folder_id.as_deref().map(parse_id::<FolderId>).transpose()?,
            favorite: self.favorite,
            name: EncString::from_raw(self.name),
            notes: self.notes.map(EncString::from_raw),
            login,
            revision_date: self.revision_date,
        })
    }
}

fn parse_id<T: std::str::FromStr>(raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| Error::InvalidInput(format!("Invalid ID in storage: {raw}")))
}
