//! Cart route handlers.
//!
//! All cart actions are HTMX posts. Mutations answer with a fragment and an
//! `HX-Trigger: cart-updated` header so the badge and dropdown refresh.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse},
};
use bytehub_core::{ProductId, cart_count};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::Visitor;
use crate::state::AppState;
use crate::views::{CartView, Pricing};

const CART_UPDATED: (&str, &str) = ("HX-Trigger", "cart-updated");

/// Add to cart form data.
///
/// `quantity` arrives as text so an empty number input is not a rejection.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl AddToCartForm {
    fn quantity(&self) -> u32 {
        self.quantity
            .as_deref()
            .and_then(|q| q.trim().parse().ok())
            .unwrap_or(1)
    }

    fn color(&self) -> Option<String> {
        self.color
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
    }
}

/// Form naming one cart line.
#[derive(Debug, Deserialize)]
pub struct LineForm {
    pub id: String,
}

/// Quantity change form data.
#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    pub id: String,
    pub delta: i32,
}

/// Cart dropdown fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_dropdown.html")]
pub struct CartDropdownTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

async fn dropdown_for(state: &AppState, visitor: &Visitor) -> CartDropdownTemplate {
    let pricing = Pricing::for_visitor(state, visitor).await;
    CartDropdownTemplate {
        cart: CartView::new(&visitor.cart().read_cart().await, &pricing),
    }
}

/// Add a catalog product to the cart.
///
/// Unknown or unpurchasable products leave the cart unchanged.
#[instrument(skip(state, visitor), fields(visitor_id = %visitor.id))]
pub async fn add(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<AddToCartForm>,
) -> Result<impl IntoResponse> {
    let cart = visitor.cart();
    let id = ProductId::new(form.product_id.trim());

    let lines = match state.catalog().get(&id).await {
        Some(product) => {
            match cart
                .add_to_cart(&product, form.quantity(), form.color())
                .await?
            {
                Some(lines) => {
                    add_breadcrumb("cart", "Added to cart", &[("product_id", id.as_str())]);
                    lines
                }
                None => cart.read_cart().await,
            }
        }
        None => {
            tracing::debug!(product_id = %id, "Add to cart for unknown product");
            cart.read_cart().await
        }
    };

    Ok((
        AppendHeaders([CART_UPDATED]),
        CartCountTemplate {
            count: cart_count(&lines),
        },
    ))
}

/// Remove a line from the cart.
#[instrument(skip(state, visitor), fields(visitor_id = %visitor.id))]
pub async fn remove(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<LineForm>,
) -> Result<impl IntoResponse> {
    visitor
        .cart()
        .remove_from_cart(&ProductId::new(form.id))
        .await?;
    Ok((
        AppendHeaders([CART_UPDATED]),
        dropdown_for(&state, &visitor).await,
    ))
}

/// Change a line's quantity by `delta` (never below 1).
#[instrument(skip(state, visitor), fields(visitor_id = %visitor.id))]
pub async fn quantity(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<QuantityForm>,
) -> Result<impl IntoResponse> {
    visitor
        .cart()
        .set_quantity(&ProductId::new(form.id), form.delta)
        .await?;
    Ok((
        AppendHeaders([CART_UPDATED]),
        dropdown_for(&state, &visitor).await,
    ))
}

/// Empty the cart.
#[instrument(skip(state, visitor), fields(visitor_id = %visitor.id))]
pub async fn empty(State(state): State<AppState>, visitor: Visitor) -> Result<impl IntoResponse> {
    visitor.cart().empty_cart().await?;
    Ok((
        AppendHeaders([CART_UPDATED]),
        dropdown_for(&state, &visitor).await,
    ))
}

/// Cart dropdown fragment.
#[instrument(skip(state, visitor), fields(visitor_id = %visitor.id))]
pub async fn dropdown(State(state): State<AppState>, visitor: Visitor) -> impl IntoResponse {
    dropdown_for(&state, &visitor).await
}

/// Cart count badge fragment.
#[instrument(skip(visitor), fields(visitor_id = %visitor.id))]
pub async fn count(visitor: Visitor) -> impl IntoResponse {
    CartCountTemplate {
        count: cart_count(&visitor.cart().read_cart().await),
    }
}
