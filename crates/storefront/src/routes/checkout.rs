//! Checkout submission.
//!
//! Validation problems are answered with an inline message fragment (status
//! 200 so HTMX swaps it in) and leave the cart untouched.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::Visitor;
use crate::services::{CheckoutForm, place_order};
use crate::state::AppState;
use crate::views::{OrderView, Pricing};

#[derive(Template, WebTemplate)]
#[template(path = "partials/order_confirmation.html")]
pub struct OrderConfirmationTemplate {
    pub order: OrderView,
}

#[derive(Template, WebTemplate)]
#[template(path = "partials/checkout_error.html")]
pub struct CheckoutErrorTemplate {
    pub message: String,
}

/// Validate the form and place the order.
#[instrument(skip(state, visitor, form), fields(visitor_id = %visitor.id))]
pub async fn submit(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let pricing = Pricing::for_visitor(&state, &visitor).await;

    match place_order(&visitor.cart(), &form).await {
        Ok(order) => {
            add_breadcrumb(
                "checkout",
                "Order placed",
                &[("order_number", &order.order_number.to_string())],
            );
            Ok((
                AppendHeaders([("HX-Trigger", "cart-updated")]),
                OrderConfirmationTemplate {
                    order: OrderView::new(&order, &pricing),
                },
            )
                .into_response())
        }
        Err(e) if e.is_validation() => {
            tracing::debug!(reason = %e, "Checkout rejected");
            Ok(CheckoutErrorTemplate {
                message: e.to_string(),
            }
            .into_response())
        }
        Err(e) => Err(e.into()),
    }
}
