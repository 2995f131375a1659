//! Encrypted store maintenance.
//!
//! These commands only apply to `STOREFRONT_STORAGE=encrypted`; the local
//! store is a plain JSON file that can be inspected directly.

use bytehub_storefront::config::{StorageConfig, database_url_from_env, redact};
use bytehub_storefront::db;
use bytehub_storefront::middleware::create_session_store;
use bytehub_storefront::storage::EncryptedStore;
use sqlx::SqlitePool;
use tracing::info;

#[derive(Debug, thiserror::Error)]
enum StoreCommandError {
    #[error("store commands need STOREFRONT_STORAGE=encrypted (configured: {0})")]
    NotEncrypted(&'static str),
}

async fn open() -> Result<(EncryptedStore, SqlitePool), Box<dyn std::error::Error>> {
    let config = StorageConfig::from_env()?;
    let StorageConfig::Encrypted { passphrase, salt } = &config else {
        return Err(StoreCommandError::NotEncrypted(config.kind()).into());
    };

    let database_url = database_url_from_env();
    info!(database = %redact(&database_url), "Connecting to database");
    let pool = db::create_pool(&database_url).await?;
    let store = EncryptedStore::new(pool.clone(), passphrase, salt.as_bytes())?;
    Ok((store, pool))
}

/// Create the store and session tables.
///
/// # Errors
///
/// Returns an error if configuration is incomplete or a statement fails.
pub async fn migrate() -> Result<(), Box<dyn std::error::Error>> {
    let (store, pool) = open().await?;
    store.migrate().await?;
    create_session_store(&pool).await?;
    info!("Store migrations complete");
    Ok(())
}

/// Print the value stored under `key` as pretty JSON.
///
/// # Errors
///
/// Returns an error if the key cannot be decrypted.
#[allow(clippy::print_stdout)]
pub async fn get(key: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (store, _) = open().await?;
    match store.get(key).await? {
        Some(json) => {
            let value: serde_json::Value = serde_json::from_str(&json)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        None => info!(key, "Key not found"),
    }
    Ok(())
}

/// Delete `key`.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub async fn remove(key: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (store, _) = open().await?;
    store.remove(key).await?;
    info!(key, "Key removed");
    Ok(())
}

/// List all keys.
///
/// # Errors
///
/// Returns an error if the query fails.
#[allow(clippy::print_stdout)]
pub async fn keys() -> Result<(), Box<dyn std::error::Error>> {
    let (store, _) = open().await?;
    for key in store.keys().await? {
        println!("{key}");
    }
    Ok(())
}
