//! Product route handlers.
//!
//! Both routes remember the product as the visitor's `currentProduct`, which
//! the standalone product page (`/p/product.html`) renders.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use bytehub_core::ProductId;
use tracing::instrument;

use super::pages::ProductDetail;
use crate::error::{AppError, Result};
use crate::middleware::Visitor;
use crate::services::preferences;
use crate::state::AppState;
use crate::views::Pricing;

/// Quick view fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/quick_view.html")]
pub struct QuickViewTemplate {
    pub detail: ProductDetail,
}

/// Open a product: remember it, then show the product page.
#[instrument(skip(state, visitor), fields(visitor_id = %visitor.id))]
pub async fn show(
    State(state): State<AppState>,
    visitor: Visitor,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let product = state
        .catalog()
        .get(&ProductId::new(id.as_str()))
        .await
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    preferences::remember_product(&visitor.store, &product).await;
    Ok(Redirect::to("/p/product.html"))
}

/// Quick view panel for a product.
#[instrument(skip(state, visitor), fields(visitor_id = %visitor.id))]
pub async fn quick_view(
    State(state): State<AppState>,
    visitor: Visitor,
    Path(id): Path<String>,
) -> Response {
    let Some(product) = state.catalog().get(&ProductId::new(id.as_str())).await else {
        return (
            StatusCode::NOT_FOUND,
            Html("<div class=\"quick-view-panel empty\">Product not found.</div>"),
        )
            .into_response();
    };

    preferences::remember_product(&visitor.store, &product).await;
    let pricing = Pricing::for_visitor(&state, &visitor).await;
    QuickViewTemplate {
        detail: ProductDetail::new(&state, &product, &pricing),
    }
    .into_response()
}
