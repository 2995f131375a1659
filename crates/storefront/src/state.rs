//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::StorefrontConfig;
use crate::feed::{Catalog, FeedClient};
use crate::services::CurrencyConverter;
use crate::storage::Storage;

/// Error creating the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: SqlitePool,
    storage: Storage,
    catalog: Catalog,
    currency: CurrencyConverter,
}

impl AppState {
    /// Create the application state.
    ///
    /// One HTTP client (with the configured timeout) is shared by the feed
    /// and the rate service.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        config: StorefrontConfig,
        pool: SqlitePool,
        storage: Storage,
    ) -> Result<Self, StateError> {
        let http = reqwest::Client::builder()
            .timeout(config.feed.http_timeout)
            .user_agent(concat!("bytehub-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let catalog = Catalog::new(
            FeedClient::new(http.clone(), config.feed.feed_url.clone()),
            config.feed.catalog_ttl,
        );
        let currency =
            CurrencyConverter::new(http, config.feed.rates_url.clone(), storage.clone());

        Ok(Self::from_parts(config, pool, storage, catalog, currency))
    }

    /// Assemble state from already-built parts.
    #[must_use]
    pub fn from_parts(
        config: StorefrontConfig,
        pool: SqlitePool,
        storage: Storage,
        catalog: Catalog,
        currency: CurrencyConverter,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                storage,
                catalog,
                currency,
            }),
        }
    }

    /// Load persisted rates, then refresh rates and the catalog in the
    /// background.
    pub async fn warm_up(&self) {
        if self.currency().load_persisted().await {
            tracing::info!("Loaded persisted exchange rates");
        }

        let state = self.clone();
        tokio::spawn(async move {
            state.currency().refresh_rates().await;
            match state.catalog().refresh().await {
                Ok(count) => tracing::info!(count, "Catalog loaded"),
                Err(e) => tracing::warn!(error = %e, "Initial catalog load failed"),
            }
        });
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// `SQLite` pool (sessions and the encrypted store).
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Unscoped visitor data store.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.inner.storage
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn currency(&self) -> &CurrencyConverter {
        &self.inner.currency
    }
}
