//! Products, cart lines and wishlist entries.
//!
//! All three serialize with the camelCase field names the storefront has always
//! persisted (`oldPrice`, `shortDesc`, `selectedColor`), so carts saved by
//! earlier deployments keep loading.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A product listing derived from one feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    /// Main image URL.
    pub img: String,
    /// Price in the base currency (USD).
    pub price: Decimal,
    /// Strikethrough price, if the listing shows one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_price: Option<Decimal>,
    pub category: String,
    #[serde(default)]
    pub short_desc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    /// Link to the blog post the product was scraped from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permalink: Option<String>,
}

impl Product {
    /// Whether the product can be put in a cart: it needs an id and a
    /// non-zero price.
    #[must_use]
    pub fn is_purchasable(&self) -> bool {
        !self.id.is_blank() && self.price > Decimal::ZERO
    }

    /// Gallery images, falling back to the main image.
    #[must_use]
    pub fn gallery(&self) -> Vec<String> {
        match &self.images {
            Some(images) if !images.is_empty() => images.clone(),
            _ => vec![self.img.clone()],
        }
    }

    /// Colour options, falling back to a single "Default" option.
    #[must_use]
    pub fn color_options(&self) -> Vec<String> {
        match &self.colors {
            Some(colors) if !colors.is_empty() => colors.clone(),
            _ => vec!["Default".to_string()],
        }
    }

    /// Case-insensitive match against title or category.
    #[must_use]
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.title.to_lowercase().contains(&query)
            || self.category.to_lowercase().contains(&query)
    }
}

const fn default_quantity() -> u32 {
    1
}

/// One row of the cart. Unique per product id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(flatten)]
    pub product: Product,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_color: Option<String>,
}

impl CartLine {
    /// Create a line, raising the quantity to at least 1.
    #[must_use]
    pub fn new(product: Product, quantity: u32, selected_color: Option<String>) -> Self {
        Self {
            product,
            quantity: quantity.max(1),
            selected_color,
        }
    }

    /// Product id of this line.
    #[must_use]
    pub const fn id(&self) -> &ProductId {
        &self.product.id
    }

    /// `price * quantity` in the base currency.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

/// A saved product. Unique per product id; carries no quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistEntry {
    #[serde(flatten)]
    pub product: Product,
}

impl WishlistEntry {
    /// Product id of this entry.
    #[must_use]
    pub const fn id(&self) -> &ProductId {
        &self.product.id
    }
}

impl From<Product> for WishlistEntry {
    fn from(product: Product) -> Self {
        Self { product }
    }
}

/// Total number of items in the cart (sum of quantities).
#[must_use]
pub fn cart_count(lines: &[CartLine]) -> u32 {
    lines.iter().map(|line| line.quantity).sum()
}

/// Cart subtotal in the base currency (sum of `price * quantity`).
#[must_use]
pub fn cart_subtotal(lines: &[CartLine]) -> Decimal {
    lines.iter().map(CartLine::line_total).sum()
}
