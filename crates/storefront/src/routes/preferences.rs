//! Theme and text direction toggles.

use axum::{http::HeaderMap, response::Response};
use tracing::instrument;

use super::reload_page;
use crate::middleware::Visitor;
use crate::services::preferences;

#[instrument(skip(visitor, headers), fields(visitor_id = %visitor.id))]
pub async fn theme(visitor: Visitor, headers: HeaderMap) -> Response {
    let theme = preferences::toggle_theme(&visitor.store).await;
    tracing::debug!(theme = theme.as_str(), "Theme toggled");
    reload_page(&headers)
}

#[instrument(skip(visitor, headers), fields(visitor_id = %visitor.id))]
pub async fn direction(visitor: Visitor, headers: HeaderMap) -> Response {
    let direction = preferences::toggle_direction(&visitor.store).await;
    tracing::debug!(direction = direction.as_str(), "Direction toggled");
    reload_page(&headers)
}
