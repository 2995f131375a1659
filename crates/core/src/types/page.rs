//! Page classification.
//!
//! Every request for a storefront page is classified exactly once into a
//! [`PageKind`], and only that kind's view is rendered. Classification is a
//! pure function of the request path and a couple of page markers.

use serde::{Deserialize, Serialize};

/// The kinds of page the storefront knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Home,
    Checkout,
    Cart,
    Wishlist,
    Product,
    Other,
}

/// Structural hints about a page, beyond its path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageMarkers {
    /// The page is a single blog post (`/YYYY/MM/slug.html`).
    pub item_view: bool,
    /// The page carries a post body to hydrate (the standalone product page).
    pub post_body: bool,
}

impl PageMarkers {
    /// Derive markers from a request path.
    #[must_use]
    pub fn for_path(path: &str) -> Self {
        let lower = path.to_lowercase();
        Self {
            item_view: is_post_path(&lower),
            post_body: lower.starts_with("/p/product"),
        }
    }
}

/// `/YYYY/MM/slug.html`
fn is_post_path(path: &str) -> bool {
    let mut segments = path.trim_start_matches('/').split('/');
    let (Some(year), Some(month), Some(slug), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return false;
    };
    year.len() == 4
        && year.bytes().all(|b| b.is_ascii_digit())
        && month.len() == 2
        && month.bytes().all(|b| b.is_ascii_digit())
        && slug.len() > ".html".len()
        && slug.ends_with(".html")
}

impl PageKind {
    /// Classify a page. Checked in order: checkout, cart, wishlist, home,
    /// product (by marker), other. Path matching is case-insensitive.
    ///
    /// ```
    /// use bytehub_core::{PageKind, PageMarkers};
    ///
    /// let kind = |p: &str| PageKind::detect(p, PageMarkers::for_path(p));
    /// assert_eq!(kind("/p/checkout.html"), PageKind::Checkout);
    /// assert_eq!(kind("/"), PageKind::Home);
    /// assert_eq!(kind("/2024/05/blue-shirt.html"), PageKind::Product);
    /// assert_eq!(kind("/p/about.html"), PageKind::Other);
    /// ```
    #[must_use]
    pub fn detect(path: &str, markers: PageMarkers) -> Self {
        let path = path.to_lowercase();

        if path.contains("/p/checkout") {
            return Self::Checkout;
        }
        if path.contains("/p/cart") {
            return Self::Cart;
        }
        if path.contains("/p/wishlist") {
            return Self::Wishlist;
        }
        if path == "/" || path.contains("/search") || path.contains("/index") {
            return Self::Home;
        }
        if markers.item_view || markers.post_body {
            return Self::Product;
        }
        Self::Other
    }

    /// Short name used in logs and as the page's body class.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Checkout => "checkout",
            Self::Cart => "cart",
            Self::Wishlist => "wishlist",
            Self::Product => "product",
            Self::Other => "other",
        }
    }
}
