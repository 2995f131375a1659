//! The visitor extractor.
//!
//! Each browser session gets a random visitor id on first use. Everything
//! the storefront persists for that visitor (cart, wishlist, currency, theme)
//! lives under that id in [`Storage`](crate::storage::Storage).

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::AppError;
use crate::services::CartService;
use crate::state::AppState;
use crate::storage::ScopedStorage;

/// Session key holding the visitor id.
pub const VISITOR_ID_KEY: &str = "visitor_id";

/// The current visitor and their storage namespace.
#[derive(Clone)]
pub struct Visitor {
    pub id: String,
    pub store: ScopedStorage,
}

impl Visitor {
    /// Cart and wishlist operations for this visitor.
    #[must_use]
    pub fn cart(&self) -> CartService {
        CartService::new(self.store.clone())
    }
}

impl FromRequestParts<AppState> for Visitor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer not installed".to_string()))?;

        let id = if let Some(id) = session.get::<String>(VISITOR_ID_KEY).await? {
            id
        } else {
            let id = Uuid::new_v4().to_string();
            session.insert(VISITOR_ID_KEY, &id).await?;
            tracing::debug!(visitor_id = %id, "New visitor");
            id
        };

        sentry::configure_scope(|scope| {
            scope.set_user(Some(sentry::User {
                id: Some(id.clone()),
                ..Default::default()
            }));
        });

        Ok(Self {
            store: state.storage().scoped(&id),
            id,
        })
    }
}
