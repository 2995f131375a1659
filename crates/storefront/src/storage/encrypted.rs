//! Asynchronous encrypted store backed by `SQLite`.
//!
//! Each value is JSON, encrypted with AES-256-GCM under a key derived by
//! Argon2id from the configured passphrase and salt. A fresh random 96-bit
//! nonce is generated for every write and stored next to the ciphertext.
//!
//! # Table: `kv_store`
//!
//! | column | type | |
//! |---|---|---|
//! | `key` | TEXT | primary key |
//! | `nonce` | BLOB | 12 bytes |
//! | `ciphertext` | BLOB | ciphertext + 16-byte tag |
//! | `updated_at` | TEXT | last write (UTC) |

use std::sync::Arc;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::Argon2;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use sqlx::SqlitePool;

use super::StorageError;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY NOT NULL,
    nonce BLOB NOT NULL,
    ciphertext BLOB NOT NULL,
    updated_at TEXT NOT NULL
)";

/// Encrypted key-value rows in `SQLite`.
#[derive(Clone)]
pub struct EncryptedStore {
    pool: SqlitePool,
    cipher: Arc<Aes256Gcm>,
}

impl EncryptedStore {
    /// Derive the store key and wrap `pool`.
    ///
    /// Key derivation is deliberately slow (Argon2 defaults); do this once at
    /// startup.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::KeyDerivation`] if the salt is shorter than
    /// Argon2 accepts.
    pub fn new(
        pool: SqlitePool,
        passphrase: &SecretString,
        salt: &[u8],
    ) -> Result<Self, StorageError> {
        let mut key = [0u8; KEY_LEN];
        Argon2::default()
            .hash_password_into(passphrase.expose_secret().as_bytes(), salt, &mut key)
            .map_err(|e| StorageError::KeyDerivation(e.to_string()))?;
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| StorageError::KeyDerivation(e.to_string()))?;

        Ok(Self {
            pool,
            cipher: Arc::new(cipher),
        })
    }

    /// Create the `kv_store` table if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Database`] if the statement fails.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    /// Decrypt the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Decrypt`] when the row does not authenticate
    /// under this store's key, or a database error.
    pub async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row: Option<(Vec<u8>, Vec<u8>)> =
            sqlx::query_as("SELECT nonce, ciphertext FROM kv_store WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        let Some((nonce, ciphertext)) = row else {
            return Ok(None);
        };
        if nonce.len() != NONCE_LEN {
            return Err(StorageError::Decrypt(key.to_string()));
        }

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&nonce), ciphertext.as_slice())
            .map_err(|_| StorageError::Decrypt(key.to_string()))?;
        String::from_utf8(plaintext)
            .map(Some)
            .map_err(|_| StorageError::Decrypt(key.to_string()))
    }

    /// Encrypt `json` with a fresh nonce and upsert it under `key`.
    ///
    /// # Errors
    ///
    /// Returns an encryption or database error.
    pub async fn set(&self, key: &str, json: &str) -> Result<(), StorageError> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), json.as_bytes())
            .map_err(|_| StorageError::Encrypt(key.to_string()))?;

        sqlx::query(
            "INSERT INTO kv_store (key, nonce, ciphertext, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
                nonce = excluded.nonce,
                ciphertext = excluded.ciphertext,
                updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(nonce.as_slice())
        .bind(ciphertext)
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete the row for `key`.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn remove(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Keys currently stored, sorted.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let keys = sqlx::query_scalar("SELECT key FROM kv_store ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        Ok(keys)
    }
}
