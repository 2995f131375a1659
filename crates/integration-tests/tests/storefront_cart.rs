//! Cart, wishlist, currency and checkout flows over HTTP.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use bytehub_integration_tests::{TestApp, sample_catalog};

const CUSTOMER: &str =
    "name=Amina+B&email=amina%40example.com&phone=0555123456&address=12+Rue+Didouche&city=Algiers";

fn badge(count: u32) -> String {
    format!(">{count}</span>")
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn test_add_to_cart_updates_badge() {
    let mut app = TestApp::new(sample_catalog()).await;

    let response = app.htmx_post("/cart/add", "product_id=mug&quantity=2").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("hx-trigger"), Some("cart-updated"));
    assert!(response.body.contains(&badge(2)));

    let again = app.htmx_post("/cart/add", "product_id=mug&quantity=").await;
    assert!(again.body.contains(&badge(3)));

    let count = app.get("/cart/count").await;
    assert!(count.body.contains(&badge(3)));
}

#[tokio::test]
async fn test_free_and_unknown_products_are_not_added() {
    let mut app = TestApp::new(sample_catalog()).await;

    let free = app.htmx_post("/cart/add", "product_id=sample").await;
    assert!(free.body.contains(&badge(0)));

    let unknown = app.htmx_post("/cart/add", "product_id=ghost").await;
    assert!(unknown.body.contains(&badge(0)));
}

#[tokio::test]
async fn test_visitors_have_separate_carts() {
    let mut first = TestApp::new(sample_catalog()).await;
    let mut second = first.new_visitor();

    first.htmx_post("/cart/add", "product_id=mug").await;
    assert!(first.get("/cart/count").await.body.contains(&badge(1)));
    assert!(second.get("/cart/count").await.body.contains(&badge(0)));
}

#[tokio::test]
async fn test_quantity_and_remove() {
    let mut app = TestApp::new(sample_catalog()).await;
    app.htmx_post("/cart/add", "product_id=shirt&quantity=3&color=Red")
        .await;

    let lowered = app.htmx_post("/cart/quantity", "id=shirt&delta=-10").await;
    assert_eq!(lowered.status, StatusCode::OK);
    assert!(app.get("/cart/count").await.body.contains(&badge(1)));

    let dropdown = app.get("/cart/dropdown").await;
    assert!(dropdown.body.contains("Blue Shirt"));
    assert!(dropdown.body.contains("Red"));

    app.htmx_post("/cart/remove", "id=shirt").await;
    assert!(app.get("/cart/count").await.body.contains(&badge(0)));
}

#[tokio::test]
async fn test_empty_cart() {
    let mut app = TestApp::new(sample_catalog()).await;
    app.htmx_post("/cart/add", "product_id=shirt").await;
    app.htmx_post("/cart/add", "product_id=mug").await;

    let response = app.htmx_post("/cart/empty", "").await;
    assert_eq!(response.header("hx-trigger"), Some("cart-updated"));
    assert!(app.get("/cart/count").await.body.contains(&badge(0)));
}

// =============================================================================
// Wishlist
// =============================================================================

#[tokio::test]
async fn test_wishlist_add_is_idempotent() {
    let mut app = TestApp::new(sample_catalog()).await;

    let first = app.htmx_post("/wishlist/add", "product_id=mug").await;
    assert_eq!(first.header("hx-trigger"), Some("wishlist-updated"));
    assert!(first.body.contains("Saved to wishlist (1)"));

    let second = app.htmx_post("/wishlist/add", "product_id=mug").await;
    assert!(second.body.contains("Saved to wishlist (1)"));

    let page = app.get("/p/wishlist.html").await;
    assert!(page.body.contains("Coffee Mug"));

    app.htmx_post("/wishlist/remove", "id=mug").await;
    let page = app.get("/p/wishlist.html").await;
    assert!(!page.body.contains("Coffee Mug"));
}

#[tokio::test]
async fn test_wishlist_unknown_product() {
    let mut app = TestApp::new(sample_catalog()).await;
    let response = app.htmx_post("/wishlist/add", "product_id=ghost").await;
    assert!(response.body.contains("Product unavailable"));
}

// =============================================================================
// Currency
// =============================================================================

#[tokio::test]
async fn test_select_currency_converts_prices() {
    let mut app = TestApp::new(sample_catalog()).await;

    let response = app.htmx_post("/currency", "code=DZD").await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(response.header("hx-refresh"), Some("true"));

    let home = app.get("/").await;
    assert!(home.body.contains("دج1350.00"));
}

#[tokio::test]
async fn test_select_currency_plain_form_redirects_back() {
    let mut app = TestApp::new(sample_catalog()).await;
    let response = app
        .post("/currency", "code=eur", Some("http://shop.test/p/cart.html"))
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), Some("/p/cart.html"));
}

#[tokio::test]
async fn test_unknown_currency_is_rejected() {
    let mut app = TestApp::new(sample_catalog()).await;
    let response = app.htmx_post("/currency", "code=XYZ").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let home = app.get("/").await;
    assert!(home.body.contains("$10.00"));
}

// =============================================================================
// Preferences
// =============================================================================

#[tokio::test]
async fn test_theme_and_direction_toggles() {
    let mut app = TestApp::new(sample_catalog()).await;

    let theme = app.htmx_post("/preferences/theme", "").await;
    assert_eq!(theme.status, StatusCode::NO_CONTENT);
    assert!(app.get("/").await.body.contains(r#"data-theme="dark""#));

    let direction = app.htmx_post("/preferences/direction", "").await;
    assert_eq!(direction.status, StatusCode::NO_CONTENT);
    assert!(app.get("/").await.body.contains(r#"dir="rtl""#));
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_checkout_with_empty_cart() {
    let mut app = TestApp::new(sample_catalog()).await;
    let response = app.htmx_post("/checkout", CUSTOMER).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Your cart is empty"));
}

#[tokio::test]
async fn test_checkout_missing_field_keeps_cart() {
    let mut app = TestApp::new(sample_catalog()).await;
    app.htmx_post("/cart/add", "product_id=mug").await;

    let response = app
        .htmx_post("/checkout", "name=Amina&email=amina%40example.com&phone=&address=x")
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("form-error"));
    assert!(app.get("/cart/count").await.body.contains(&badge(1)));
}

#[tokio::test]
async fn test_checkout_invalid_email_keeps_cart() {
    let mut app = TestApp::new(sample_catalog()).await;
    app.htmx_post("/cart/add", "product_id=mug").await;

    let response = app
        .htmx_post(
            "/checkout",
            "name=Amina&email=not-an-email&phone=0555&address=12+Rue",
        )
        .await;
    assert!(response.body.contains("form-error"));
    assert!(app.get("/cart/count").await.body.contains(&badge(1)));
}

#[tokio::test]
async fn test_checkout_places_order_and_clears_cart() {
    let mut app = TestApp::new(sample_catalog()).await;
    app.htmx_post("/cart/add", "product_id=mug&quantity=2").await;

    let response = app.htmx_post("/checkout", CUSTOMER).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("hx-trigger"), Some("cart-updated"));
    assert!(response.body.contains("Thank you for your order"));
    assert!(response.body.contains("$20.00"));
    assert!(response.body.contains("Cash on delivery"));

    assert!(app.get("/cart/count").await.body.contains(&badge(0)));
}

// =============================================================================
// Encrypted storage
// =============================================================================

#[tokio::test]
async fn test_cart_over_encrypted_storage() {
    use bytehub_storefront::storage::{EncryptedStore, Storage};
    use secrecy::SecretString;

    let pool = bytehub_storefront::db::create_pool(&SecretString::from("sqlite::memory:"))
        .await
        .unwrap();
    let store = EncryptedStore::new(
        pool,
        &SecretString::from("q8#Lm2!vZx7@Rt4$Wn9%Kp3^Hy6&"),
        b"integration-salt",
    )
    .unwrap();
    store.migrate().await.unwrap();

    let mut app = TestApp::with_storage(sample_catalog(), Storage::from(store.clone())).await;
    app.htmx_post("/cart/add", "product_id=mug&quantity=2").await;
    assert!(app.get("/cart/count").await.body.contains(&badge(2)));

    let keys = store.keys().await.unwrap();
    assert_eq!(keys.len(), 1);
    assert!(keys[0].ends_with(":cart"));
}
