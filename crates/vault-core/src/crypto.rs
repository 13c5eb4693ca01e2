//! Scope-aware field encryption
//!
//! Every string field of a cipher is sealed with AES-256-GCM under the key of
//! its scope: the personal key, or the key of the owning organization.
//! Sealed values are stored as `<nonce_b64>|<ciphertext_b64>`.

use std::collections::BTreeMap;
use std::fmt;

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{OrganizationId, Scope};

const NONCE_SIZE: usize = 12; // 96 bits for GCM
const KEY_SIZE: usize = 32; // 256 bits
const SEPARATOR: char = '|';

/// An encrypted field value
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncString(String);

impl EncString {
    /// Wrap an already-sealed value, e.g. one read back from storage
    pub fn from_raw(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn parts(&self) -> Result<(Vec<u8>, Vec<u8>)> {
        let (nonce, ciphertext) = self
            .0
            .split_once(SEPARATOR)
            .ok_or_else(|| Error::Crypto("Malformed encrypted value".to_string()))?;
        let nonce = STANDARD
            .decode(nonce)
            .map_err(|e| Error::Crypto(format!("Invalid nonce encoding: {e}")))?;
        let ciphertext = STANDARD
            .decode(ciphertext)
            .map_err(|e| Error::Crypto(format!("Invalid ciphertext encoding: {e}")))?;
        if nonce.len() != NONCE_SIZE {
            return Err(Error::Crypto(format!(
                "Invalid nonce length {} (expected {NONCE_SIZE})",
                nonce.len()
            )));
        }
        Ok((nonce, ciphertext))
    }
}

// Ciphertext is not secret, but it is noise in logs.
impl fmt::Debug for EncString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncString({} bytes)", self.0.len())
    }
}

/// Encrypts and decrypts field values for a scope
pub trait CryptoService: Send + Sync {
    fn encrypt(&self, plaintext: &str, scope: &Scope) -> Result<EncString>;

    fn decrypt(&self, value: &EncString, scope: &Scope) -> Result<String>;
}

/// Symmetric keys for the personal scope and every known organization
#[derive(Clone)]
pub struct KeyRing {
    personal: [u8; KEY_SIZE],
    organizations: BTreeMap<OrganizationId, [u8; KEY_SIZE]>,
}

impl fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRing")
            .field("personal", &"[REDACTED]")
            .field("organizations", &self.organizations.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl KeyRing {
    /// Create a key ring with a freshly generated personal key
    #[must_use]
    pub fn generate() -> Self {
        Self {
            personal: random_key(),
            organizations: BTreeMap::new(),
        }
    }

    /// Generate and register a key for an organization, replacing any existing one
    pub fn add_organization(&mut self, organization_id: OrganizationId) {
        self.organizations.insert(organization_id, random_key());
    }

    /// Organizations this key ring can seal values for
    pub fn organizations(&self) -> impl Iterator<Item = &OrganizationId> {
        self.organizations.keys()
    }

    fn key_for(&self, scope: &Scope) -> Result<&[u8; KEY_SIZE]> {
        match scope {
            Scope::Personal => Ok(&self.personal),
            Scope::Organization(id) => self
                .organizations
                .get(id)
                .ok_or_else(|| Error::Crypto(format!("No key for organization {id}"))),
        }
    }

    fn cipher_for(&self, scope: &Scope) -> Result<Aes256Gcm> {
        let key = self.key_for(scope)?;
        Aes256Gcm::new_from_slice(key)
            .map_err(|e| Error::Crypto(format!("Cipher initialization failed: {e}")))
    }

    /// Serialize the key ring for a secret store
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&KeyRingFile::from(self))?)
    }

    /// Parse a key ring written by [`KeyRing::to_json`]
    pub fn from_json(raw: &str) -> Result<Self> {
        let file: KeyRingFile = serde_json::from_str(raw)?;
        file.try_into()
    }
}

impl CryptoService for KeyRing {
    fn encrypt(&self, plaintext: &str, scope: &Scope) -> Result<EncString> {
        let cipher = self.cipher_for(scope)?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| Error::Crypto(format!("Encryption failed: {e}")))?;

        Ok(EncString(format!(
            "{}{SEPARATOR}{}",
            STANDARD.encode(nonce),
            STANDARD.encode(ciphertext)
        )))
    }

    fn decrypt(&self, value: &EncString, scope: &Scope) -> Result<String> {
        let cipher = self.cipher_for(scope)?;
        let (nonce, ciphertext) = value.parts()?;
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce), ciphertext.as_ref())
            .map_err(|e| Error::Crypto(format!("Decryption failed: {e}")))?;

        String::from_utf8(plaintext)
            .map_err(|e| Error::Crypto(format!("Decrypted value is not UTF-8: {e}")))
    }
}

fn random_key() -> [u8; KEY_SIZE] {
    let mut key = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut key);
    key
}

/// Stored representation of a key ring
#[derive(Serialize, Deserialize)]
struct KeyRingFile {
    personal: String,
    #[serde(default)]
    organizations: BTreeMap<String, String>,
}

impl From<&KeyRing> for KeyRingFile {
    fn from(key_ring: &KeyRing) -> Self {
        Self {
            personal: STANDARD.encode(key_ring.personal),
            organizations: key_ring
                .organizations
                .iter()
                .map(|(id, key)| (id.to_string(), STANDARD.encode(key)))
                .collect(),
        }
    }
}

impl TryFrom<KeyRingFile> for KeyRing {
    type Error = Error;

    fn try_from(file: KeyRingFile) -> Result<Self> {
        let organizations = file
            .organizations
            .into_iter()
            .map(|(id, key)| Ok((OrganizationId::new(id), decode_key(&key)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(Self {
            personal: decode_key(&file.personal)?,
            organizations,
        })
    }
}

fn decode_key(encoded: &str) -> Result<[u8; KEY_SIZE]> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| Error::Crypto(format!("Invalid key encoding: {e}")))?;
    bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| Error::Crypto(format!("Invalid key length {}", bytes.len())))
}
