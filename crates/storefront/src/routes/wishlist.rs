//! Wishlist route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse},
};
use bytehub_core::ProductId;
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::Visitor;
use crate::state::AppState;
use crate::views::{Pricing, ProductView, wishlist_views};

const WISHLIST_UPDATED: (&str, &str) = ("HX-Trigger", "wishlist-updated");

#[derive(Debug, Deserialize)]
pub struct AddToWishlistForm {
    pub product_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RemoveFromWishlistForm {
    pub id: String,
}

/// "Saved" button state after an add.
#[derive(Template, WebTemplate)]
#[template(path = "partials/wishlist_button.html")]
pub struct WishlistButtonTemplate {
    pub saved: bool,
    pub count: usize,
}

/// Wishlist items fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/wishlist_items.html")]
pub struct WishlistItemsTemplate {
    pub items: Vec<ProductView>,
}

/// Save a catalog product. Saving twice keeps one entry.
#[instrument(skip(state, visitor), fields(visitor_id = %visitor.id))]
pub async fn add(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<AddToWishlistForm>,
) -> Result<impl IntoResponse> {
    let cart = visitor.cart();
    let id = ProductId::new(form.product_id.trim());
    let saved = match state.catalog().get(&id).await {
        Some(product) => {
            cart.toggle_wishlist(&product).await?;
            true
        }
        None => false,
    };

    Ok((
        AppendHeaders([WISHLIST_UPDATED]),
        WishlistButtonTemplate {
            saved,
            count: cart.read_wishlist().await.len(),
        },
    ))
}

/// Remove an entry and return the remaining items.
#[instrument(skip(state, visitor), fields(visitor_id = %visitor.id))]
pub async fn remove(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<RemoveFromWishlistForm>,
) -> Result<impl IntoResponse> {
    let entries = visitor
        .cart()
        .remove_from_wishlist(&ProductId::new(form.id))
        .await?;
    let pricing = Pricing::for_visitor(&state, &visitor).await;
    Ok((
        AppendHeaders([WISHLIST_UPDATED]),
        WishlistItemsTemplate {
            items: wishlist_views(&entries, &pricing),
        },
    ))
}
