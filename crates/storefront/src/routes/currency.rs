//! Currency selection.

use axum::{Form, http::HeaderMap, response::Response};
use serde::Deserialize;
use tracing::instrument;

use super::reload_page;
use crate::error::Result;
use crate::middleware::Visitor;
use crate::services::select_currency;

#[derive(Debug, Deserialize)]
pub struct CurrencyForm {
    pub code: String,
}

/// Persist the visitor's currency; every price on the page changes, so the
/// page is reloaded.
#[instrument(skip(visitor, headers), fields(visitor_id = %visitor.id))]
pub async fn select(
    visitor: Visitor,
    headers: HeaderMap,
    Form(form): Form<CurrencyForm>,
) -> Result<Response> {
    let currency = select_currency(&visitor.store, &form.code).await?;
    tracing::debug!(currency = currency.code(), "Currency selected");
    Ok(reload_page(&headers))
}
