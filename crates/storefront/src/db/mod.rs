//! `SQLite` connection pool.
//!
//! One database file holds two tables:
//!
//! - `tower_sessions` - session rows (created by the session store's migration)
//! - `kv_store` - encrypted visitor data (created by `EncryptedStore::migrate`)

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

/// Create a `SQLite` connection pool.
///
/// In-memory databases are limited to a single connection so every query sees
/// the same database.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<SqlitePool, sqlx::Error> {
    let url = database_url.expose_secret();
    let max_connections = if url.contains(":memory:") { 1 } else { 5 };

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(url)
        .await
}
