//! Page handlers.
//!
//! Every GET that no other route claims lands here and is classified once
//! with [`PageKind::detect`]; only that page's view is built.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use bytehub_core::{PageKind, PageMarkers, Product};
use serde::Deserialize;
use tracing::instrument;

use crate::middleware::Visitor;
use crate::services::preferences;
use crate::state::AppState;
use crate::views::{CartView, Chrome, Pricing, ProductView, ShareLinks, wishlist_views};

/// Search box query.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// A product with its share links, as shown in the quick view and on the
/// product page.
#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub product: ProductView,
    pub share: ShareLinks,
}

impl ProductDetail {
    #[must_use]
    pub fn new(state: &AppState, product: &Product, pricing: &Pricing) -> Self {
        let product = ProductView::new(product, pricing);
        let config = state.config();
        let share = ShareLinks::new(
            &product,
            &config.base_url,
            config.whatsapp_number.as_deref(),
        );
        Self { product, share }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub chrome: Chrome,
    pub products: Vec<ProductView>,
}

#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartPageTemplate {
    pub chrome: Chrome,
    pub cart: CartView,
}

#[derive(Template, WebTemplate)]
#[template(path = "wishlist.html")]
pub struct WishlistPageTemplate {
    pub chrome: Chrome,
    pub items: Vec<ProductView>,
}

#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutPageTemplate {
    pub chrome: Chrome,
    pub cart: CartView,
}

#[derive(Template, WebTemplate)]
#[template(path = "product.html")]
pub struct ProductPageTemplate {
    pub chrome: Chrome,
    pub detail: Option<ProductDetail>,
}

#[derive(Template, WebTemplate)]
#[template(path = "other.html")]
pub struct OtherPageTemplate {
    pub chrome: Chrome,
    pub path: String,
}

/// Render the page for the request path.
#[instrument(skip(state, visitor, query), fields(visitor_id = %visitor.id))]
pub async fn page(
    State(state): State<AppState>,
    visitor: Visitor,
    uri: Uri,
    Query(query): Query<PageQuery>,
) -> Response {
    let path = uri.path();
    let kind = PageKind::detect(path, PageMarkers::for_path(path));
    tracing::debug!(page = kind.as_str(), "Rendering page");

    let pricing = Pricing::for_visitor(&state, &visitor).await;
    let chrome = Chrome::load(&visitor, &pricing, kind.as_str()).await;

    match kind {
        PageKind::Home => {
            let query = query.q.unwrap_or_default();
            let products = if query.trim().is_empty() {
                state.catalog().products().await
            } else {
                state.catalog().search(&query).await
            };
            HomeTemplate {
                chrome: chrome.with_query(query),
                products: ProductView::list(&products, &pricing),
            }
            .into_response()
        }
        PageKind::Cart => CartPageTemplate {
            chrome,
            cart: CartView::new(&visitor.cart().read_cart().await, &pricing),
        }
        .into_response(),
        PageKind::Wishlist => WishlistPageTemplate {
            chrome,
            items: wishlist_views(&visitor.cart().read_wishlist().await, &pricing),
        }
        .into_response(),
        PageKind::Checkout => CheckoutPageTemplate {
            chrome,
            cart: CartView::new(&visitor.cart().read_cart().await, &pricing),
        }
        .into_response(),
        PageKind::Product => {
            let product = product_for_page(&state, &visitor, path).await;
            ProductPageTemplate {
                chrome,
                detail: product.map(|p| ProductDetail::new(&state, &p, &pricing)),
            }
            .into_response()
        }
        PageKind::Other => (
            StatusCode::NOT_FOUND,
            OtherPageTemplate {
                chrome,
                path: path.to_string(),
            },
        )
            .into_response(),
    }
}

/// The product a product page shows.
///
/// A blog post URL shows the catalog product published at that URL (and
/// remembers it); the standalone product page shows the last product the
/// visitor opened.
async fn product_for_page(state: &AppState, visitor: &Visitor, path: &str) -> Option<Product> {
    if PageMarkers::for_path(path).item_view {
        let published = state
            .catalog()
            .products()
            .await
            .into_iter()
            .find(|p| p.permalink.as_deref().is_some_and(|link| same_path(link, path)));
        if let Some(product) = published {
            preferences::remember_product(&visitor.store, &product).await;
            return Some(product);
        }
    }
    preferences::current_product(&visitor.store).await
}

fn same_path(permalink: &str, path: &str) -> bool {
    url::Url::parse(permalink).is_ok_and(|url| url.path().eq_ignore_ascii_case(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_path() {
        assert!(same_path(
            "https://bytehub.blogspot.com/2024/05/Blue-Shirt.html",
            "/2024/05/blue-shirt.html"
        ));
        assert!(!same_path("not a url", "/2024/05/x.html"));
        assert!(!same_path("https://b.example/2024/05/a.html", "/2024/05/b.html"));
    }
}
