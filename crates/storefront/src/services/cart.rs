//! Cart and wishlist operations over one visitor's storage.
//!
//! Every mutation is a read-modify-write of the whole list under the key's
//! update lock, so concurrent requests from the same visitor never drop each
//! other's changes.

use bytehub_core::{CartLine, Product, ProductId, WishlistEntry};

use crate::storage::{ScopedStorage, StorageError, keys};

/// Cart and wishlist manager for a single visitor.
#[derive(Clone)]
pub struct CartService {
    store: ScopedStorage,
}

impl CartService {
    #[must_use]
    pub const fn new(store: ScopedStorage) -> Self {
        Self { store }
    }

    /// The visitor storage this service writes to.
    #[must_use]
    pub const fn store(&self) -> &ScopedStorage {
        &self.store
    }

    /// Current cart; missing or unreadable data is an empty cart.
    pub async fn read_cart(&self) -> Vec<CartLine> {
        self.store
            .get::<Vec<CartLine>>(keys::CART)
            .await
            .unwrap_or_default()
    }

    /// Add `quantity` of `product`, merging with an existing line.
    ///
    /// Returns `Ok(None)` without touching storage when the product has no id
    /// or no price.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated cart cannot be written.
    pub async fn add_to_cart(
        &self,
        product: &Product,
        quantity: u32,
        color: Option<String>,
    ) -> Result<Option<Vec<CartLine>>, StorageError> {
        if !product.is_purchasable() {
            tracing::debug!(product_id = %product.id, "Ignoring add of unpurchasable product");
            return Ok(None);
        }

        let (cart, ()) = self
            .store
            .update(keys::CART, |lines: &mut Vec<CartLine>| {
                match lines.iter_mut().find(|line| line.id() == &product.id) {
                    Some(line) => {
                        line.quantity = line.quantity.saturating_add(quantity.max(1));
                        if color.is_some() {
                            line.selected_color = color;
                        }
                    }
                    None => lines.push(CartLine::new(product.clone(), quantity, color)),
                }
            })
            .await?;
        Ok(Some(cart))
    }

    /// Remove the line for `id`. Other lines are untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated cart cannot be written.
    pub async fn remove_from_cart(&self, id: &ProductId) -> Result<Vec<CartLine>, StorageError> {
        let (cart, ()) = self
            .store
            .update(keys::CART, |lines: &mut Vec<CartLine>| {
                lines.retain(|line| line.id() != id);
            })
            .await?;
        Ok(cart)
    }

    /// Change a line's quantity by `delta`, never going below 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated cart cannot be written.
    pub async fn set_quantity(
        &self,
        id: &ProductId,
        delta: i32,
    ) -> Result<Vec<CartLine>, StorageError> {
        let (cart, ()) = self
            .store
            .update(keys::CART, |lines: &mut Vec<CartLine>| {
                if let Some(line) = lines.iter_mut().find(|line| line.id() == id) {
                    let next = i64::from(line.quantity) + i64::from(delta);
                    line.quantity = u32::try_from(next.max(1)).unwrap_or(u32::MAX);
                }
            })
            .await?;
        Ok(cart)
    }

    /// Persist an empty cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the empty cart cannot be written.
    pub async fn empty_cart(&self) -> Result<(), StorageError> {
        self.store
            .update(keys::CART, |lines: &mut Vec<CartLine>| lines.clear())
            .await?;
        Ok(())
    }

    /// Current wishlist; missing or unreadable data is an empty list.
    pub async fn read_wishlist(&self) -> Vec<WishlistEntry> {
        self.store
            .get::<Vec<WishlistEntry>>(keys::WISHLIST)
            .await
            .unwrap_or_default()
    }

    /// Add `product` to the wishlist if it is not already there.
    ///
    /// Never removes: toggling a saved product leaves the list unchanged.
    /// Returns whether the product was added.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated list cannot be written.
    pub async fn toggle_wishlist(&self, product: &Product) -> Result<bool, StorageError> {
        if product.id.is_blank() {
            return Ok(false);
        }
        let (_, added) = self
            .store
            .update(keys::WISHLIST, |entries: &mut Vec<WishlistEntry>| {
                if entries.iter().any(|entry| entry.id() == &product.id) {
                    false
                } else {
                    entries.push(WishlistEntry::from(product.clone()));
                    true
                }
            })
            .await?;
        Ok(added)
    }

    /// Remove `id` from the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated list cannot be written.
    pub async fn remove_from_wishlist(
        &self,
        id: &ProductId,
    ) -> Result<Vec<WishlistEntry>, StorageError> {
        let (entries, ()) = self
            .store
            .update(keys::WISHLIST, |entries: &mut Vec<WishlistEntry>| {
                entries.retain(|entry| entry.id() != id);
            })
            .await?;
        Ok(entries)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bytehub_core::{cart_count, cart_subtotal};
    use rust_decimal::Decimal;

    use super::*;
    use crate::storage::Storage;

    fn product(id: &str, price: i64) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            img: "a.jpg".to_string(),
            price: Decimal::from(price),
            old_price: None,
            category: "Clothing".to_string(),
            short_desc: String::new(),
            colors: None,
            images: None,
            permalink: None,
        }
    }

    fn service() -> CartService {
        CartService::new(Storage::in_memory().scoped("visitor-1"))
    }

    #[tokio::test]
    async fn test_adding_same_product_twice_merges() {
        let cart = service();
        let shirt = product("shirt", 20);
        cart.add_to_cart(&shirt, 1, None).await.unwrap();
        let lines = cart.add_to_cart(&shirt, 1, None).await.unwrap().unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(cart.read_cart().await, lines);
    }

    #[tokio::test]
    async fn test_remove_leaves_other_lines() {
        let cart = service();
        cart.add_to_cart(&product("a", 5), 1, None).await.unwrap();
        cart.add_to_cart(&product("b", 7), 3, None).await.unwrap();

        let lines = cart.remove_from_cart(&ProductId::new("b")).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].id().as_str(), "a");
        assert_eq!(lines[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_unpurchasable_product_is_ignored() {
        let cart = service();
        assert_eq!(cart.add_to_cart(&product("free", 0), 1, None).await.unwrap(), None);
        assert_eq!(cart.add_to_cart(&product("", 5), 1, None).await.unwrap(), None);
        assert!(cart.read_cart().await.is_empty());
        assert_eq!(cart.store().get::<Vec<CartLine>>(keys::CART).await, None);
    }

    #[tokio::test]
    async fn test_zero_quantity_adds_one() {
        let cart = service();
        let lines = cart.add_to_cart(&product("a", 5), 0, None).await.unwrap().unwrap();
        assert_eq!(lines[0].quantity, 1);
        let lines = cart.add_to_cart(&product("a", 5), 0, None).await.unwrap().unwrap();
        assert_eq!(lines[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_set_quantity_clamps_to_one() {
        let cart = service();
        cart.add_to_cart(&product("a", 5), 2, None).await.unwrap();
        let id = ProductId::new("a");

        let lines = cart.set_quantity(&id, 3).await.unwrap();
        assert_eq!(lines[0].quantity, 5);
        let lines = cart.set_quantity(&id, -10).await.unwrap();
        assert_eq!(lines[0].quantity, 1);
        let lines = cart.set_quantity(&ProductId::new("missing"), 1).await.unwrap();
        assert_eq!(lines.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_cart_persists_empty_list() {
        let cart = service();
        cart.add_to_cart(&product("a", 5), 2, None).await.unwrap();
        cart.empty_cart().await.unwrap();
        assert_eq!(
            cart.store().get::<Vec<CartLine>>(keys::CART).await,
            Some(Vec::new())
        );
    }

    #[tokio::test]
    async fn test_color_selection_kept_and_updated() {
        let cart = service();
        let p = product("a", 5);
        cart.add_to_cart(&p, 1, Some("Red".to_string())).await.unwrap();
        let lines = cart.add_to_cart(&p, 1, None).await.unwrap().unwrap();
        assert_eq!(lines[0].selected_color.as_deref(), Some("Red"));
        let lines = cart
            .add_to_cart(&p, 1, Some("Blue".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(lines[0].selected_color.as_deref(), Some("Blue"));
    }

    #[tokio::test]
    async fn test_count_and_subtotal() {
        let cart = service();
        cart.add_to_cart(&product("a", 20), 2, None).await.unwrap();
        cart.add_to_cart(&product("b", 5), 1, None).await.unwrap();
        let lines = cart.read_cart().await;
        assert_eq!(cart_count(&lines), 3);
        assert_eq!(cart_subtotal(&lines), Decimal::from(45));
    }

    #[tokio::test]
    async fn test_wishlist_toggle_never_removes() {
        let cart = service();
        let p = product("a", 5);
        assert!(cart.toggle_wishlist(&p).await.unwrap());
        assert!(!cart.toggle_wishlist(&p).await.unwrap());
        assert_eq!(cart.read_wishlist().await.len(), 1);
    }

    #[tokio::test]
    async fn test_wishlist_remove() {
        let cart = service();
        cart.toggle_wishlist(&product("a", 5)).await.unwrap();
        cart.toggle_wishlist(&product("b", 5)).await.unwrap();
        let entries = cart.remove_from_wishlist(&ProductId::new("a")).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id().as_str(), "b");
    }

    #[tokio::test]
    async fn test_visitors_are_isolated() {
        let storage = Storage::in_memory();
        let alice = CartService::new(storage.scoped("alice"));
        let bob = CartService::new(storage.scoped("bob"));
        alice.add_to_cart(&product("a", 5), 1, None).await.unwrap();
        assert!(bob.read_cart().await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_sum() {
        let cart = service();
        let p = product("a", 5);
        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let cart = cart.clone();
                let p = p.clone();
                tokio::spawn(async move { cart.add_to_cart(&p, 1, None).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        let lines = cart.read_cart().await;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 20);
    }

    #[tokio::test]
    async fn test_parsed_feed_entry_goes_into_cart() {
        use crate::feed::{FeedEntry, parse_entry};

        let entry: FeedEntry = serde_json::from_str(
            r#"{
                "id":{"$t":"post-1"},
                "title":{"$t":"Shirt"},
                "content":{"$t":"<img src='a.jpg'>Price: $20 ~$30~"},
                "category":[{"term":"Clothing"}]
            }"#,
        )
        .unwrap();
        let shirt = parse_entry(&entry);

        let cart = service();
        cart.add_to_cart(&shirt, 1, None).await.unwrap();

        let lines = cart.read_cart().await;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 1);
        assert_eq!(lines[0].product.price, Decimal::from(20));
        assert_eq!(lines[0].product.old_price, Some(Decimal::from(30)));
        assert_eq!(lines[0].product.img, "a.jpg");
        assert_eq!(lines[0].product.category, "Clothing");
    }
}
