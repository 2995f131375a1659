//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness
//! GET  /health/ready                - Readiness (database)
//! GET  /static/*                    - Stylesheets and images
//!
//! # Cart (HTMX fragments)
//! POST /cart/add                    - Add to cart (count badge, triggers cart-updated)
//! POST /cart/remove                 - Remove line (dropdown fragment)
//! POST /cart/quantity               - Change quantity by delta (dropdown fragment)
//! POST /cart/empty                  - Empty cart (dropdown fragment)
//! GET  /cart/dropdown               - Dropdown fragment
//! GET  /cart/count                  - Count badge fragment
//!
//! # Wishlist
//! POST /wishlist/add                - Save product (never removes)
//! POST /wishlist/remove             - Remove entry (wishlist fragment)
//!
//! # Products
//! GET  /products/{id}               - Open product page
//! GET  /products/{id}/quick-view    - Quick view fragment
//!
//! # Visitor settings
//! POST /currency                    - Select display currency
//! POST /preferences/theme           - Toggle dark theme
//! POST /preferences/direction       - Toggle RTL
//!
//! # Checkout
//! POST /checkout                    - Validate and confirm order
//!
//! # Pages
//! GET  *                            - Classified by path: home, cart,
//!                                     wishlist, checkout, product, other
//! ```

pub mod cart;
pub mod checkout;
pub mod currency;
pub mod pages;
pub mod preferences;
pub mod products;
pub mod wishlist;

use axum::{
    Router,
    http::{HeaderMap, StatusCode, header},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
        .route("/quantity", post(cart::quantity))
        .route("/empty", post(cart::empty))
        .route("/dropdown", get(cart::dropdown))
        .route("/count", get(cart::count))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/add", post(wishlist::add))
        .route("/remove", post(wishlist::remove))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(products::show))
        .route("/{id}/quick-view", get(products::quick_view))
}

/// Create the visitor preference routes router.
pub fn preference_routes() -> Router<AppState> {
    Router::new()
        .route("/theme", post(preferences::theme))
        .route("/direction", post(preferences::direction))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/products", product_routes())
        .nest("/preferences", preference_routes())
        .route("/currency", post(currency::select))
        .route("/checkout", post(checkout::submit))
        .fallback(pages::page)
}

/// Response to a setting change that affects every price or the whole
/// layout: HTMX requests get `HX-Refresh`, plain form posts are sent back to
/// the page they came from.
pub(crate) fn reload_page(headers: &HeaderMap) -> Response {
    if headers.contains_key("hx-request") {
        return (
            StatusCode::NO_CONTENT,
            AppendHeaders([("HX-Refresh", "true")]),
        )
            .into_response();
    }
    Redirect::to(&back_path(headers)).into_response()
}

/// Path of the referring page, or `/`. Only the path and query are kept so
/// the redirect never leaves the site.
fn back_path(headers: &HeaderMap) -> String {
    headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|referer| url::Url::parse(referer).ok())
        .map_or_else(
            || "/".to_string(),
            |url| match url.query() {
                Some(query) => format!("{}?{query}", url.path()),
                None => url.path().to_string(),
            },
        )
}
