//! In-memory product index built from the last successful feed fetch.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use bytehub_core::{Product, ProductId};
use moka::future::Cache;

use super::{FeedClient, FeedError};

const SNAPSHOT_KEY: &str = "feed";

/// Products in feed order plus an id index.
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    products: Vec<Product>,
    index: HashMap<ProductId, usize>,
}

impl CatalogSnapshot {
    /// Build a snapshot. On duplicate ids the first product wins the index.
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        let mut index = HashMap::with_capacity(products.len());
        for (position, product) in products.iter().enumerate() {
            index.entry(product.id.clone()).or_insert(position);
        }
        Self { products, index }
    }

    /// All products in feed order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.index.get(id).and_then(|&i| self.products.get(i))
    }

    /// Products whose title or category contains `query`.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<Product> {
        self.products
            .iter()
            .filter(|p| p.matches_query(query))
            .cloned()
            .collect()
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Returns `true` if the snapshot has no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Product catalog with a TTL-cached feed snapshot.
///
/// A failed refresh keeps serving the last good snapshot (empty before the
/// first success) for one TTL period. Concurrent refreshes are coalesced
/// into one fetch.
#[derive(Clone)]
pub struct Catalog {
    client: Option<FeedClient>,
    cache: Cache<&'static str, Arc<CatalogSnapshot>>,
    last_good: Arc<RwLock<Arc<CatalogSnapshot>>>,
}

impl Catalog {
    /// Catalog backed by a live feed.
    #[must_use]
    pub fn new(client: FeedClient, ttl: Duration) -> Self {
        Self {
            client: Some(client),
            cache: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
            last_good: Arc::default(),
        }
    }

    /// Catalog with a fixed product list and no feed.
    #[must_use]
    pub fn from_products(products: Vec<Product>) -> Self {
        Self {
            client: None,
            cache: Cache::builder().max_capacity(1).build(),
            last_good: Arc::new(RwLock::new(Arc::new(CatalogSnapshot::new(products)))),
        }
    }

    /// Current snapshot, refreshing from the feed when the cached one expired.
    pub async fn snapshot(&self) -> Arc<CatalogSnapshot> {
        let Some(client) = &self.client else {
            return self.last_good();
        };

        let fetched = self
            .cache
            .try_get_with(SNAPSHOT_KEY, async {
                let products = client.fetch().await?;
                let snapshot = Arc::new(CatalogSnapshot::new(products));
                self.store_last_good(Arc::clone(&snapshot));
                Ok::<_, FeedError>(snapshot)
            })
            .await;

        match fetched {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "Feed refresh failed, serving last good catalog");
                // At most one failed fetch per TTL period.
                let fallback = self.last_good();
                self.cache.insert(SNAPSHOT_KEY, Arc::clone(&fallback)).await;
                fallback
            }
        }
    }

    /// Force a refresh on the next access and perform it now.
    ///
    /// # Errors
    ///
    /// Returns the feed error when the fetch fails. The previous snapshot
    /// stays in service.
    pub async fn refresh(&self) -> Result<usize, FeedError> {
        let Some(client) = &self.client else {
            return Ok(self.last_good().len());
        };
        let products = client.fetch().await?;
        let snapshot = Arc::new(CatalogSnapshot::new(products));
        let count = snapshot.len();
        self.store_last_good(Arc::clone(&snapshot));
        self.cache.insert(SNAPSHOT_KEY, snapshot).await;
        Ok(count)
    }

    /// All products in feed order.
    pub async fn products(&self) -> Vec<Product> {
        self.snapshot().await.products().to_vec()
    }

    /// Look up a product by id.
    pub async fn get(&self, id: &ProductId) -> Option<Product> {
        self.snapshot().await.get(id).cloned()
    }

    /// Case-insensitive title/category search.
    pub async fn search(&self, query: &str) -> Vec<Product> {
        self.snapshot().await.search(query)
    }

    fn last_good(&self) -> Arc<CatalogSnapshot> {
        match self.last_good.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn store_last_good(&self, snapshot: Arc<CatalogSnapshot>) {
        match self.last_good.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("client", &self.client)
            .field("cached", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn product(id: &str, title: &str, category: &str) -> Product {
        Product {
            id: ProductId::new(id),
            title: title.to_string(),
            img: "a.jpg".to_string(),
            price: Decimal::from(10),
            old_price: None,
            category: category.to_string(),
            short_desc: String::new(),
            colors: None,
            images: None,
            permalink: None,
        }
    }

    #[tokio::test]
    async fn test_static_catalog_lookup() {
        let catalog = Catalog::from_products(vec![
            product("1", "Red Shirt", "Clothing"),
            product("2", "Mug", "Kitchen"),
        ]);
        assert_eq!(catalog.products().await.len(), 2);
        assert_eq!(
            catalog.get(&ProductId::new("2")).await.unwrap().title,
            "Mug"
        );
        assert!(catalog.get(&ProductId::new("3")).await.is_none());
    }

    #[tokio::test]
    async fn test_search_matches_title_and_category() {
        let catalog = Catalog::from_products(vec![
            product("1", "Red Shirt", "Clothing"),
            product("2", "Mug", "Kitchen"),
        ]);
        assert_eq!(catalog.search("shirt").await.len(), 1);
        assert_eq!(catalog.search("KITCHEN").await[0].id.as_str(), "2");
        assert_eq!(catalog.search("").await.len(), 2);
    }

    #[test]
    fn test_duplicate_ids_index_first() {
        let snapshot = CatalogSnapshot::new(vec![
            product("1", "First", "A"),
            product("1", "Second", "A"),
        ]);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get(&ProductId::new("1")).unwrap().title, "First");
    }

    #[tokio::test]
    async fn test_unreachable_feed_serves_empty_catalog() {
        let client =
            FeedClient::with_timeout("http://127.0.0.1:9/feed", Duration::from_millis(200))
                .unwrap();
        let catalog = Catalog::new(client, Duration::from_secs(60));
        assert!(catalog.products().await.is_empty());
        assert!(catalog.refresh().await.is_err());
    }
}
