//! Key-value persistence for carts, wishlists and preferences.
//!
//! Two interchangeable backends, selected once at startup:
//!
//! - [`LocalStore`] - synchronous, JSON strings in process memory, optionally
//!   mirrored to a file.
//! - [`EncryptedStore`] - asynchronous, AES-256-GCM encrypted rows in `SQLite`
//!   with a fresh nonce per write.
//!
//! Both hold JSON-serialized values. The public `get`/`set`/`remove` never
//! fail: errors are logged and read as "no data" (`None`) or `false`. The
//! `try_*` variants surface [`StorageError`] for callers that need it.
//!
//! Every visitor gets a [`ScopedStorage`] whose keys are prefixed with the
//! visitor id. Read-modify-write sequences go through [`ScopedStorage::update`],
//! which holds a per-key lock so two concurrent updates cannot both start from
//! the same prior value.

mod encrypted;
mod local;
mod locks;

pub use encrypted::EncryptedStore;
pub use local::LocalStore;
pub use locks::KeyLocks;

use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::config::StorageConfig;

/// Well-known storage keys.
pub mod keys {
    /// Visitor's cart (`Vec<CartLine>`).
    pub const CART: &str = "cart";
    /// Visitor's wishlist (`Vec<WishlistEntry>`).
    pub const WISHLIST: &str = "wishlist";
    /// Visitor's selected currency code.
    pub const CURRENCY: &str = "currency";
    /// Shared exchange rate table (unscoped).
    pub const CURRENCY_RATES: &str = "currencyRates";
    /// Last product the visitor opened, used by the product page.
    pub const CURRENT_PRODUCT: &str = "currentProduct";
    /// Visitor's theme (`light` / `dark`).
    pub const THEME: &str = "theme";
    /// Visitor's text direction (`ltr` / `rtl`).
    pub const DIRECTION: &str = "direction";
}

/// Errors raised by the storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Value could not be serialized or stored JSON could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `SQLite` operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Reading or writing the local mirror file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The store key could not be derived from the passphrase.
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// Encrypting a value failed.
    #[error("Encryption failed for key {0}")]
    Encrypt(String),

    /// Ciphertext did not authenticate (wrong key, tampering, corruption).
    #[error("Decryption failed for key {0}")]
    Decrypt(String),

    /// A thread panicked while holding the local store lock.
    #[error("Local store lock poisoned")]
    Poisoned,
}

#[derive(Clone)]
enum Backend {
    Local(LocalStore),
    Encrypted(EncryptedStore),
}

/// The configured storage backend plus the per-key update locks.
#[derive(Clone)]
pub struct Storage {
    backend: Backend,
    locks: KeyLocks,
}

impl From<LocalStore> for Storage {
    fn from(store: LocalStore) -> Self {
        Self {
            backend: Backend::Local(store),
            locks: KeyLocks::new(),
        }
    }
}

impl From<EncryptedStore> for Storage {
    fn from(store: EncryptedStore) -> Self {
        Self {
            backend: Backend::Encrypted(store),
            locks: KeyLocks::new(),
        }
    }
}

impl Storage {
    /// Open the backend named by `config`.
    ///
    /// The encrypted backend derives its key and creates its table on `pool`.
    ///
    /// # Errors
    ///
    /// Returns an error if key derivation or the schema migration fails.
    pub async fn open(config: &StorageConfig, pool: &SqlitePool) -> Result<Self, StorageError> {
        let storage: Self = match config {
            StorageConfig::Local { path: Some(path) } => LocalStore::open(path.clone()).into(),
            StorageConfig::Local { path: None } => LocalStore::in_memory().into(),
            StorageConfig::Encrypted { passphrase, salt } => {
                let store = EncryptedStore::new(pool.clone(), passphrase, salt.as_bytes())?;
                store.migrate().await?;
                store.into()
            }
        };
        tracing::info!(backend = storage.kind(), "Storage opened");
        Ok(storage)
    }

    /// An empty in-memory local store. Used by tests and the CLI.
    #[must_use]
    pub fn in_memory() -> Self {
        LocalStore::in_memory().into()
    }

    /// Backend name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self.backend {
            Backend::Local(_) => "local",
            Backend::Encrypted(_) => "encrypted",
        }
    }

    /// Read the raw JSON stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns the backend's error (database, decryption, poisoned lock).
    pub async fn try_get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        match &self.backend {
            Backend::Local(store) => store.get(key),
            Backend::Encrypted(store) => store.get(key).await,
        }
    }

    /// Store raw JSON under `key`.
    ///
    /// # Errors
    ///
    /// Returns the backend's error.
    pub async fn try_set_raw(&self, key: &str, json: String) -> Result<(), StorageError> {
        match &self.backend {
            Backend::Local(store) => store.set(key, json),
            Backend::Encrypted(store) => store.set(key, &json).await,
        }
    }

    /// Delete `key`. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns the backend's error.
    pub async fn try_remove(&self, key: &str) -> Result<(), StorageError> {
        match &self.backend {
            Backend::Local(store) => store.remove(key),
            Backend::Encrypted(store) => store.remove(key).await,
        }
    }

    /// Read and deserialize `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the stored JSON does not
    /// match `T`.
    pub async fn try_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.try_get_raw(key).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Serialize and store `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backend fails.
    pub async fn try_set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let json = serde_json::to_string(value)?;
        self.try_set_raw(key, json).await
    }

    /// Read `key`, treating any failure as "no data".
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.try_get(key).await.unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "Storage read failed, treating as empty");
            None
        })
    }

    /// Write `key`; returns whether the write succeeded.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        match self.try_set(key, value).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "Storage write failed");
                false
            }
        }
    }

    /// Remove `key`; returns whether the removal succeeded.
    pub async fn remove(&self, key: &str) -> bool {
        match self.try_remove(key).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "Storage remove failed");
                false
            }
        }
    }

    /// A view of this store whose keys are prefixed with `scope`.
    #[must_use]
    pub fn scoped(&self, scope: &str) -> ScopedStorage {
        ScopedStorage {
            storage: self.clone(),
            prefix: scope.to_string(),
        }
    }
}

/// One visitor's slice of the store.
#[derive(Clone)]
pub struct ScopedStorage {
    storage: Storage,
    prefix: String,
}

impl ScopedStorage {
    /// The fully-qualified key for `key`.
    #[must_use]
    pub fn qualify(&self, key: &str) -> String {
        format!("{}:{key}", self.prefix)
    }

    /// The scope (visitor id) of this view.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.prefix
    }

    /// The unscoped store behind this view.
    #[must_use]
    pub const fn storage(&self) -> &Storage {
        &self.storage
    }

    /// See [`Storage::get`].
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.storage.get(&self.qualify(key)).await
    }

    /// See [`Storage::set`].
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        self.storage.set(&self.qualify(key), value).await
    }

    /// See [`Storage::remove`].
    pub async fn remove(&self, key: &str) -> bool {
        self.storage.remove(&self.qualify(key)).await
    }

    /// Read-modify-write `key` under its update lock.
    ///
    /// A missing or unreadable value starts from `T::default()`. The closure's
    /// result is returned together with the value as persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated value cannot be written; the stored
    /// value is then unchanged.
    pub async fn update<T, R, F>(&self, key: &str, mutate: F) -> Result<(T, R), StorageError>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> R,
    {
        let qualified = self.qualify(key);
        let _guard = self.storage.locks.lock(&qualified).await;

        let mut value: T = self.storage.get(&qualified).await.unwrap_or_default();
        let result = mutate(&mut value);
        self.storage.try_set(&qualified, &value).await?;
        Ok((value, result))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let storage = Storage::in_memory();
        assert_eq!(storage.get::<Vec<u32>>("cart").await, None);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let storage = Storage::in_memory();
        assert!(storage.set("currency", "DZD").await);
        assert_eq!(storage.get::<String>("currency").await.as_deref(), Some("DZD"));
    }

    #[tokio::test]
    async fn test_remove() {
        let storage = Storage::in_memory();
        storage.set("currency", "EUR").await;
        assert!(storage.remove("currency").await);
        assert!(storage.remove("currency").await);
        assert_eq!(storage.get::<String>("currency").await, None);
    }

    #[tokio::test]
    async fn test_corrupt_value_reads_as_none() {
        let storage = Storage::in_memory();
        storage
            .try_set_raw("cart", "{not json".to_string())
            .await
            .unwrap();
        assert_eq!(storage.get::<Vec<u32>>("cart").await, None);
        assert!(storage.try_get::<Vec<u32>>("cart").await.is_err());
    }

    #[tokio::test]
    async fn test_scopes_are_isolated() {
        let storage = Storage::in_memory();
        let alice = storage.scoped("alice");
        let bob = storage.scoped("bob");

        alice.set("currency", "EUR").await;
        assert_eq!(alice.get::<String>("currency").await.as_deref(), Some("EUR"));
        assert_eq!(bob.get::<String>("currency").await, None);
        assert_eq!(
            storage.get::<String>("alice:currency").await.as_deref(),
            Some("EUR")
        );
    }

    #[tokio::test]
    async fn test_update_starts_from_default() {
        let storage = Storage::in_memory().scoped("v");
        let (value, len) = storage
            .update("numbers", |numbers: &mut Vec<u32>| {
                numbers.push(7);
                numbers.len()
            })
            .await
            .unwrap();
        assert_eq!(value, vec![7]);
        assert_eq!(len, 1);
        assert_eq!(storage.get::<Vec<u32>>("numbers").await, Some(vec![7]));
    }

    #[tokio::test]
    async fn test_concurrent_updates_do_not_lose_writes() {
        let storage = Storage::in_memory().scoped("v");
        let mut handles = Vec::new();
        for _ in 0..25 {
            let storage = storage.clone();
            handles.push(tokio::spawn(async move {
                storage
                    .update("counter", |n: &mut u32| {
                        *n += 1;
                    })
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(storage.get::<u32>("counter").await, Some(25));
    }
}
